//! The DataStore singleton (C9 state) and the open Object Handle (C3).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dsal_config::Config;
use tracing::{debug, trace, warn};

use crate::backend::{Backend, BackendObject, BackendRegistry, CallerCtx, IoOpPayload};
use crate::error::{DsalError, Result};
use crate::iovec::IoVec;
use crate::oid::ObjectId;
use crate::op::{CompletionCallback, IoOp, IoOpType};

/// Process-wide handle bound to exactly one backend for its lifetime.
///
/// Rather than a global singleton reached through ambient state,
/// `DataStore::init` hands the embedder an `Arc<DataStore>` to thread
/// through explicitly; an `ObjectHandle` holds a clone of that `Arc` rather
/// than a borrowed reference, which keeps the backend alive for exactly as
/// long as any handle needs it without an explicit lifetime parameter.
pub struct DataStore {
    backend_type: String,
    flags: i32,
    backend: Arc<dyn Backend>,
}

impl DataStore {
    /// Looks up `dstore.type` in `cfg`, resolves it against `registry` by
    /// exact name match, and runs the backend's own `init`. Exactly one
    /// `DataStore` should exist per process; nothing here enforces that
    /// beyond convention (there is no natural way to enforce a process-wide
    /// singleton from within a library crate without reaching for a
    /// `static`, which is deliberately avoided here).
    #[tracing::instrument(skip(registry, cfg))]
    pub async fn init(registry: &BackendRegistry, cfg: &Config, flags: i32) -> Result<Arc<Self>> {
        let backend_type = cfg
            .get_required("dstore", "type")
            .map_err(|_| DsalError::InvalidArgument("dstore.type".to_string()))?
            .to_string();

        let backend = registry.resolve(&backend_type).ok_or_else(|| {
            DsalError::InvalidArgument(format!("unknown dstore type: {backend_type}"))
        })?;

        backend.init(cfg).await?;

        debug!(backend_type, "dstore initialized");
        Ok(Arc::new(Self {
            backend_type,
            flags,
            backend,
        }))
    }

    pub async fn fini(self: Arc<Self>) -> Result<()> {
        trace!(backend_type = %self.backend_type, "dstore fini");
        self.backend.fini().await
    }

    pub fn backend_type(&self) -> &str {
        &self.backend_type
    }

    pub fn flags(&self) -> i32 {
        self.flags
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn obj_create(&self, ctx: CallerCtx<'_>, oid: ObjectId) -> Result<()> {
        self.backend.obj_create(ctx, oid).await
    }

    /// `-ENOENT` is logged as a warning and still returned to the caller;
    /// the core does not swallow it itself.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn obj_delete(&self, ctx: CallerCtx<'_>, oid: ObjectId) -> Result<()> {
        let result = self.backend.obj_delete(ctx, oid).await;
        if let Err(DsalError::NotFound) = &result {
            warn!(?oid, "obj_delete: object did not exist");
        }
        result
    }

    pub async fn obj_get_new_id(&self) -> Result<ObjectId> {
        self.backend.obj_get_new_id().await
    }

    pub async fn get_bsize(&self, oid: ObjectId) -> Result<u32> {
        self.backend.obj_get_bsize(oid).await
    }

    /// Opens `oid`, stamping the returned handle with this store and the
    /// OID, and transfers ownership to the caller. There is no secondary
    /// stamping step that can itself fail once the backend handle is
    /// materialized (the fields are simply moved in): failure before a
    /// `BackendObject` exists returns `Err` with nothing to release, and
    /// success always yields a fully-formed handle.
    #[tracing::instrument(skip(self))]
    pub async fn obj_open(self: &Arc<Self>, oid: ObjectId) -> Result<ObjectHandle> {
        let backend_obj = self.backend.obj_open(oid).await?;
        Ok(ObjectHandle {
            oid,
            store: Arc::clone(self),
            backend_obj,
            inflight: Arc::new(AtomicUsize::new(0)),
            notify: Arc::new(tokio::sync::Notify::new()),
        })
    }
}

/// An open, in-memory representation of a stored object.
///
/// An open handle must outlive every [`IoOp`] it spawns until those
/// operations reach a terminal state; [`ObjectHandle::close`] enforces
/// this by blocking until an in-flight counter drains to zero.
pub struct ObjectHandle {
    oid: ObjectId,
    store: Arc<DataStore>,
    backend_obj: Box<dyn BackendObject>,
    inflight: Arc<AtomicUsize>,
    notify: Arc<tokio::sync::Notify>,
}

impl ObjectHandle {
    pub fn oid(&self) -> ObjectId {
        self.oid
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    /// Builds and binds a new [`IoOp`] to this handle, incrementing the
    /// in-flight counter so `close` can block on it. The counter is
    /// decremented when the returned op is finalized via
    /// [`ObjectHandle::finish_io_op`].
    pub async fn new_io_op(
        &self,
        op_type: IoOpType,
        vec: IoVec,
        cb: Option<CompletionCallback>,
    ) -> Result<IoOp> {
        let backend_op = self
            .backend_obj
            .io_op_init(op_type, IoOpPayload::Data(vec))
            .await?;
        self.inflight.fetch_add(1, Ordering::SeqCst);
        Ok(IoOp::new(op_type, backend_op, cb))
    }

    /// Builds and binds a new extent-only (`Free`) [`IoOp`], for callers
    /// that never had a data buffer in the first place (C8's zero-fill
    /// shrink issues these instead of writing zero bytes over the wire).
    pub async fn new_free_op(
        &self,
        extents: crate::iovec::ExtentVec,
        cb: Option<CompletionCallback>,
    ) -> Result<IoOp> {
        let backend_op = self
            .backend_obj
            .io_op_init(IoOpType::Free, IoOpPayload::Extents(extents))
            .await?;
        self.inflight.fetch_add(1, Ordering::SeqCst);
        Ok(IoOp::new(IoOpType::Free, backend_op, cb))
    }

    /// Finalizes an op spawned by this handle, returning the payload
    /// handed to [`ObjectHandle::new_io_op`] filled in for reads. Must be
    /// called exactly once per `IoOp` returned by `new_io_op`, after the
    /// op has reached a terminal state (`IoOp::fini` itself asserts this).
    pub async fn finish_io_op(&self, op: IoOp) -> IoOpPayload {
        let payload = op.fini().await;
        if self.inflight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
        payload
    }

    /// Blocks until every in-flight operation spawned through this handle
    /// has reached a terminal state, then closes the backend handle.
    /// Double-close is undefined behaviour.
    #[tracing::instrument(skip(self), fields(oid = ?self.oid))]
    pub async fn close(self) -> Result<()> {
        while self.inflight.load(Ordering::SeqCst) != 0 {
            self.notify.notified().await;
        }
        self.backend_obj.close().await
    }
}
