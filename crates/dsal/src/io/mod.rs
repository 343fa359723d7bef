//! Positional IO: aligned primitives (C5), hole-tolerant aligned reads
//! (C6), unaligned IO (C7), and resize/shrink (C8).
//!
//! Each function here operates on an already-open [`crate::object::ObjectHandle`]
//! and a block size `bs` supplied by the caller (the façade is the only
//! place that looks `bs` up via `DataStore::get_bsize`). None of this
//! module does IO of its own; it only ever builds an [`crate::iovec::IoVec`]
//! and drives it through the handle's `new_io_op`/`submit`/`wait`/
//! `finish_io_op` lifecycle.

pub mod aligned;
pub mod resize;
pub mod unaligned;

use crate::error::{from_backend_rc, Result};
use crate::iovec::IoVec;
use crate::object::ObjectHandle;
use crate::op::IoOpType;

/// Drives one data-bearing `IoVec` through the full op lifecycle and
/// returns the (possibly filled-in) vector handed back by `fini`.
pub(crate) async fn run_data_op(
    handle: &ObjectHandle,
    op_type: IoOpType,
    vec: IoVec,
) -> Result<IoVec> {
    let mut op = handle.new_io_op(op_type, vec, None).await?;
    op.submit().await?;
    let rc = op.wait().await;
    let payload = handle.finish_io_op(op).await;
    from_backend_rc(rc)?;
    Ok(payload
        .into_data()
        .expect("data-bearing op returns a Data payload"))
}

/// Aligned-vs-unaligned write dispatch, ported from `__dstore_pwrite`.
pub async fn pwrite(handle: &ObjectHandle, offset: u64, buf: &[u8], bs: u32) -> Result<()> {
    let bsz = bs as u64;
    if buf.len() as u64 % bsz == 0 && offset % bsz == 0 {
        aligned::pwrite_aligned(handle, buf, offset).await
    } else {
        unaligned::pwrite_unaligned(handle, offset, buf, bs).await
    }
}

/// Aligned-vs-unaligned read dispatch, ported from `__dstore_pread`.
pub async fn pread(handle: &ObjectHandle, offset: u64, buf: &mut [u8], bs: u32) -> Result<()> {
    let bsz = bs as u64;
    if buf.len() as u64 % bsz == 0 && offset % bsz == 0 {
        aligned::pread_aligned_handle_holes(handle, buf, offset, bs).await
    } else {
        unaligned::pread_unaligned(handle, offset, buf, bs).await
    }
}
