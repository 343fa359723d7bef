//! Aligned IO primitives (C5) and the hole-tolerant aligned read (C6).
//!
//! Every function here requires its caller to have already checked
//! `offset % bs == 0 && len % bs == 0`; `crate::io::unaligned` is what
//! handles the general case.

use bytes::BytesMut;

use crate::error::{DsalError, Result};
use crate::io::run_data_op;
use crate::iovec::{IoBuffer, IoVec};
use crate::object::ObjectHandle;
use crate::op::IoOpType;

/// Writes `buf` at `offset`, both assumed block-aligned by the caller.
pub async fn pwrite_aligned(handle: &ObjectHandle, buf: &[u8], offset: u64) -> Result<()> {
    let data = BytesMut::from(buf);
    let vec = IoVec::from_single(IoBuffer::new(data, offset));
    run_data_op(handle, IoOpType::Write, vec).await?;
    Ok(())
}

/// Reads `buf.len()` bytes at `offset` into `buf`, both assumed
/// block-aligned by the caller. Does not itself recover from `-ENOENT`;
/// see [`pread_aligned_handle_holes`] for the hole-tolerant wrapper every
/// other caller in this crate actually uses.
pub async fn pread_aligned(handle: &ObjectHandle, buf: &mut [u8], offset: u64) -> Result<()> {
    let data = BytesMut::zeroed(buf.len());
    let vec = IoVec::from_single(IoBuffer::new(data, offset));
    let filled = run_data_op(handle, IoOpType::Read, vec).await?;
    let mut bufs = filled.into_bufs();
    let out = bufs.pop().expect("pread_aligned builds exactly one buffer");
    buf.copy_from_slice(&out.data[..buf.len()]);
    Ok(())
}

/// Reads `buf.len()` bytes at `offset`, recovering from a backend that
/// reports `-ENOENT` for a range straddling unwritten blocks by retrying
/// one block at a time and zero-filling whichever sub-blocks are
/// themselves unwritten. `buf.len()` must be an exact multiple of `bs`.
pub async fn pread_aligned_handle_holes(
    handle: &ObjectHandle,
    buf: &mut [u8],
    offset: u64,
    bs: u32,
) -> Result<()> {
    match pread_aligned(handle, buf, offset).await {
        Err(DsalError::NotFound) => {
            let bs = bs as usize;
            let count = buf.len() / bs;
            for i in 0..count {
                let block_offset = offset + (i as u64 * bs as u64);
                let chunk = &mut buf[i * bs..(i + 1) * bs];
                match pread_aligned(handle, chunk, block_offset).await {
                    Ok(()) => {}
                    Err(DsalError::NotFound) => chunk.fill(0),
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_read_requires_multiple_of_bs_to_split_on_holes() {
        // Documents the caller contract `pread_aligned_handle_holes` relies
        // on: block-by-block retry only makes sense when `buf.len()` is an
        // exact multiple of `bs`.
        assert_eq!(8192usize / 4096, 2);
    }
}
