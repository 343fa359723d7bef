//! Public façade (C9): the one surface an embedder is expected to call.
//!
//! Every entry point here is a thin, `tracing::instrument`-annotated
//! wrapper around the lower layers: `object::DataStore`/`ObjectHandle` for
//! lifecycle operations, `io::{pwrite, pread}` for positional IO, and
//! `io::resize::resize` for truncation.

use std::sync::Arc;

use dsal_config::Config;
use tracing::instrument;

use crate::backend::{BackendRegistry, CallerCtx};
use crate::error::Result;
use crate::io;
use crate::object::{DataStore, ObjectHandle};
use crate::oid::ObjectId;

/// Initializes the store exactly once per process, resolving `dstore.type`
/// in `cfg` against `registry`, and returns an `Arc<DataStore>` for the
/// embedder to thread through explicitly rather than installing a
/// process-wide global.
#[instrument(skip(registry, cfg))]
pub async fn dstore_init(registry: &BackendRegistry, cfg: &Config, flags: i32) -> Result<Arc<DataStore>> {
    DataStore::init(registry, cfg, flags).await
}

pub async fn dstore_fini(store: Arc<DataStore>) -> Result<()> {
    store.fini().await
}

#[instrument(skip(store, ctx))]
pub async fn obj_create(store: &DataStore, ctx: CallerCtx<'_>, oid: ObjectId) -> Result<()> {
    store.obj_create(ctx, oid).await
}

#[instrument(skip(store, ctx))]
pub async fn obj_delete(store: &DataStore, ctx: CallerCtx<'_>, oid: ObjectId) -> Result<()> {
    store.obj_delete(ctx, oid).await
}

pub async fn obj_get_new_id(store: &DataStore) -> Result<ObjectId> {
    store.obj_get_new_id().await
}

pub async fn get_bsize(store: &DataStore, oid: ObjectId) -> Result<u32> {
    store.get_bsize(oid).await
}

#[instrument(skip(store))]
pub async fn obj_open(store: &Arc<DataStore>, oid: ObjectId) -> Result<ObjectHandle> {
    store.obj_open(oid).await
}

pub async fn obj_close(handle: ObjectHandle) -> Result<()> {
    handle.close().await
}

/// Writes `count` bytes from `buf` at `offset`, dispatching to the aligned
/// or unaligned path depending on `offset`/`count` against `bs`.
#[instrument(skip(handle, buf), fields(oid = ?handle.oid(), offset, bs))]
pub async fn pwrite(handle: &ObjectHandle, offset: u64, buf: &[u8], bs: u32) -> Result<()> {
    debug_assert!(!buf.is_empty(), "pwrite requires a non-empty buffer");
    debug_assert!(bs > 0, "pwrite requires a positive block size");
    io::pwrite(handle, offset, buf, bs).await
}

/// Reads `buf.len()` bytes at `offset` into `buf`.
#[instrument(skip(handle, buf), fields(oid = ?handle.oid(), offset, bs))]
pub async fn pread(handle: &ObjectHandle, offset: u64, buf: &mut [u8], bs: u32) -> Result<()> {
    debug_assert!(!buf.is_empty(), "pread requires a non-empty buffer");
    debug_assert!(bs > 0, "pread requires a positive block size");
    io::pread(handle, offset, buf, bs).await
}

/// Resizes an object from `old_size` to `new_size`. Growing is a no-op;
/// shrinking zero-fills the truncated range in `MAX_IO`-sized chunks. `bs`
/// is required here rather than looked up internally, matching Open
/// Question OQ-5 (the façade's other positional entry points already take
/// `bs` explicitly).
#[instrument(skip(handle), fields(oid = ?handle.oid(), old_size, new_size, bs))]
pub async fn resize(handle: &ObjectHandle, old_size: u64, new_size: u64, bs: u32) -> Result<()> {
    io::resize::resize(handle, old_size, new_size, bs).await
}
