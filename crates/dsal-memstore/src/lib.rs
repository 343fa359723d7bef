//! An in-process, single-pool reference backend implementing the 12-op
//! table: an `Arc`-shared pool of objects, each a sparse map of `bs`-sized
//! blocks.
//!
//! Unwritten blocks behave the way a sparse object-store backend typically
//! does: a read touching any unwritten block within its requested range
//! fails whole with `DsalError::NotFound`, pushing the retry-and-zero-fill
//! burden onto `dsal::io::aligned::pread_aligned_handle_holes` rather than
//! silently zero-filling here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use dsal::{
    Backend, BackendObject, BackendOp, CallerCtx, DsalError, IoOpPayload, IoOpType, ObjectId,
    Result,
};
use dsal_config::Config;

const DEFAULT_BSIZE: u32 = 4096;
const ENOENT: i32 = 2;

type BlockMap = HashMap<u64, Bytes>;
type ObjectRecord = Arc<RwLock<BlockMap>>;

/// A single in-process pool of objects, each a sparse map of `bs`-sized
/// blocks keyed by block index.
pub struct MemBackend {
    bs: AtomicU32,
    objects: Arc<RwLock<HashMap<ObjectId, ObjectRecord>>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self {
            bs: AtomicU32::new(DEFAULT_BSIZE),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn bs(&self) -> u32 {
        self.bs.load(Ordering::Relaxed)
    }
}

impl Default for MemBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemBackend {
    async fn init(&self, cfg: &Config) -> Result<()> {
        if let Some(bs) = cfg.get("dstore", "bsize").and_then(|v| v.parse().ok()) {
            self.bs.store(bs, Ordering::Relaxed);
        }
        debug!(bs = self.bs(), "memstore initialized");
        Ok(())
    }

    async fn fini(&self) -> Result<()> {
        Ok(())
    }

    async fn obj_create(&self, _ctx: CallerCtx<'_>, oid: ObjectId) -> Result<()> {
        let mut objects = self.objects.write().await;
        objects
            .entry(oid)
            .or_insert_with(|| Arc::new(RwLock::new(HashMap::new())));
        trace!(?oid, "object created");
        Ok(())
    }

    async fn obj_delete(&self, _ctx: CallerCtx<'_>, oid: ObjectId) -> Result<()> {
        let mut objects = self.objects.write().await;
        objects.remove(&oid).ok_or(DsalError::NotFound)?;
        trace!(?oid, "object deleted");
        Ok(())
    }

    async fn obj_get_new_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::new_random())
    }

    async fn obj_open(&self, oid: ObjectId) -> Result<Box<dyn BackendObject>> {
        let objects = self.objects.read().await;
        let record = objects.get(&oid).cloned().ok_or(DsalError::NotFound)?;
        Ok(Box::new(MemObject {
            record,
            bs: self.bs(),
        }))
    }

    async fn obj_get_bsize(&self, _oid: ObjectId) -> Result<u32> {
        Ok(self.bs())
    }
}

struct MemObject {
    record: ObjectRecord,
    bs: u32,
}

#[async_trait]
impl BackendObject for MemObject {
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn io_op_init(
        &self,
        op_type: IoOpType,
        payload: IoOpPayload,
    ) -> Result<Box<dyn BackendOp>> {
        Ok(Box::new(MemOp {
            op_type,
            record: Arc::clone(&self.record),
            bs: self.bs,
            payload,
            rc: 0,
        }))
    }
}

struct MemOp {
    op_type: IoOpType,
    record: ObjectRecord,
    bs: u32,
    payload: IoOpPayload,
    rc: i32,
}

impl MemOp {
    async fn do_write(&mut self) -> i32 {
        let bs = self.bs as u64;
        let vec = match &self.payload {
            IoOpPayload::Data(v) => v,
            IoOpPayload::Extents(_) => return -(libc_einval()),
        };
        let mut blocks = self.record.write().await;
        for buf in vec.bufs() {
            debug_assert_eq!(buf.offset % bs, 0, "memstore only accepts block-aligned writes");
            debug_assert_eq!(
                buf.size() as u64 % bs,
                0,
                "memstore only accepts multi-block writes"
            );
            let nblocks = buf.size() as u64 / bs;
            for i in 0..nblocks {
                let idx = buf.offset / bs + i;
                let start = (i * bs) as usize;
                let chunk = Bytes::copy_from_slice(&buf.data[start..start + bs as usize]);
                blocks.insert(idx, chunk);
            }
        }
        0
    }

    async fn do_read(&mut self) -> i32 {
        let bs = self.bs as u64;
        let blocks = self.record.read().await;
        let vec = match &mut self.payload {
            IoOpPayload::Data(v) => v,
            IoOpPayload::Extents(_) => return -(libc_einval()),
        };
        for buf in vec.bufs_mut() {
            debug_assert_eq!(buf.offset % bs, 0, "memstore only accepts block-aligned reads");
            debug_assert_eq!(
                buf.size() as u64 % bs,
                0,
                "memstore only accepts multi-block reads"
            );
            let nblocks = buf.size() as u64 / bs;
            for i in 0..nblocks {
                let idx = buf.offset / bs + i;
                match blocks.get(&idx) {
                    Some(chunk) => {
                        let start = (i * bs) as usize;
                        buf.data[start..start + bs as usize].copy_from_slice(chunk);
                    }
                    None => return -ENOENT,
                }
            }
        }
        0
    }

    async fn do_free(&mut self) -> i32 {
        let bs = self.bs as u64;
        let extents = match &self.payload {
            IoOpPayload::Extents(e) => e,
            IoOpPayload::Data(_) => return -(libc_einval()),
        };
        let mut blocks = self.record.write().await;
        for extent in &extents.extents {
            debug_assert_eq!(extent.offset % bs, 0);
            debug_assert_eq!(extent.size % bs, 0);
            let nblocks = extent.size / bs;
            for i in 0..nblocks {
                blocks.remove(&(extent.offset / bs + i));
            }
        }
        0
    }
}

#[async_trait]
impl BackendOp for MemOp {
    async fn submit(&mut self) -> Result<()> {
        self.rc = match self.op_type {
            IoOpType::Write => self.do_write().await,
            IoOpType::Read => self.do_read().await,
            IoOpType::Free => self.do_free().await,
        };
        Ok(())
    }

    async fn wait(&mut self) -> i32 {
        self.rc
    }

    async fn fini(self: Box<Self>) -> IoOpPayload {
        self.payload
    }
}

const fn libc_einval() -> i32 {
    22
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsal::{BackendRegistry, IoBuffer, IoVec};

    #[tokio::test]
    async fn write_then_read_back_one_block() {
        let backend = MemBackend::new();
        let cfg = Config::with_value("dstore", "bsize", "4096");
        backend.init(&cfg).await.unwrap();

        let oid = ObjectId::from_parts(1, 1);
        backend.obj_create(None, oid).await.unwrap();
        let obj = backend.obj_open(oid).await.unwrap();

        let write_buf = IoVec::from_single(IoBuffer::new(
            bytes::BytesMut::from(vec![7u8; 4096].as_slice()),
            0,
        ));
        let mut op = obj
            .io_op_init(IoOpType::Write, IoOpPayload::Data(write_buf))
            .await
            .unwrap();
        op.submit().await.unwrap();
        assert_eq!(op.wait().await, 0);
        op.fini().await;

        let read_buf = IoVec::from_single(IoBuffer::new(bytes::BytesMut::zeroed(4096), 0));
        let mut op = obj
            .io_op_init(IoOpType::Read, IoOpPayload::Data(read_buf))
            .await
            .unwrap();
        op.submit().await.unwrap();
        assert_eq!(op.wait().await, 0);
        let payload = op.fini().await;
        let data = payload.into_data().unwrap();
        assert_eq!(&data.bufs()[0].data[..], &[7u8; 4096][..]);
    }

    #[tokio::test]
    async fn reading_an_unwritten_block_reports_not_found() {
        let backend = MemBackend::new();
        let oid = ObjectId::from_parts(2, 2);
        backend.obj_create(None, oid).await.unwrap();
        let obj = backend.obj_open(oid).await.unwrap();

        let read_buf = IoVec::from_single(IoBuffer::new(bytes::BytesMut::zeroed(4096), 0));
        let mut op = obj
            .io_op_init(IoOpType::Read, IoOpPayload::Data(read_buf))
            .await
            .unwrap();
        op.submit().await.unwrap();
        assert_eq!(op.wait().await, -ENOENT);
    }

    #[test]
    fn registry_registration_is_exact_match() {
        let mut registry = BackendRegistry::new();
        registry.register("memory", || Arc::new(MemBackend::new()));
        assert!(registry.resolve("memory").is_some());
        assert!(registry.resolve("mem").is_none());
    }
}
