//! Unaligned IO (C7): read-modify-write of partial edge blocks around an
//! otherwise-aligned middle range, arithmetic done in `u64` throughout to
//! match this crate's OID and extent types.

use crate::error::Result;
use crate::io::aligned::{pread_aligned_handle_holes, pwrite_aligned};
use crate::object::ObjectHandle;

/// Writes `buf` at an arbitrary `offset`, reading back whichever of the
/// left/right edge blocks are partially overwritten, splicing `buf` into
/// the result, and issuing a single aligned write spanning every block
/// `buf` touches.
pub async fn pwrite_unaligned(
    handle: &ObjectHandle,
    offset: u64,
    buf: &[u8],
    bs: u32,
) -> Result<()> {
    let count = buf.len() as u64;
    let bsz = bs as u64;

    let left_blk_num = offset / bsz;
    let mut right_blk_num = (offset + count) / bsz;
    if (offset + count) % bsz == 0 {
        right_blk_num -= 1;
    }
    let num_of_blks = right_blk_num - left_blk_num + 1;

    let mut tmp = vec![0u8; (num_of_blks * bsz) as usize];

    if offset % bsz != 0 {
        pread_aligned_handle_holes(handle, &mut tmp[0..bs as usize], left_blk_num * bsz, bs)
            .await?;
    }

    if (offset + count) % bsz != 0 && left_blk_num != right_blk_num {
        let tail_start = ((num_of_blks - 1) * bsz) as usize;
        pread_aligned_handle_holes(
            handle,
            &mut tmp[tail_start..tail_start + bs as usize],
            right_blk_num * bsz,
            bs,
        )
        .await?;
    }

    let buf_pos = (offset - left_blk_num * bsz) as usize;
    tmp[buf_pos..buf_pos + buf.len()].copy_from_slice(buf);

    pwrite_aligned(handle, &tmp, left_blk_num * bsz).await
}

/// Reads `buf.len()` bytes starting at an arbitrary `offset`, splitting the
/// range into an optional unaligned left edge, an aligned middle run, and
/// an optional unaligned right edge.
pub async fn pread_unaligned(
    handle: &ObjectHandle,
    offset: u64,
    buf: &mut [u8],
    bs: u32,
) -> Result<()> {
    let bsz = bs as u64;
    let mut offset = offset;
    let mut count = buf.len() as u64;
    let mut buf_pos: u64 = 0;

    if !(offset % bsz == 0 && count >= bsz) {
        let left_blk_num = offset / bsz;
        let left_bytes = offset - (left_blk_num * bsz);
        let right_bytes = bsz - left_bytes;
        let read_count = count.min(right_bytes);

        let mut tmp = vec![0u8; bs as usize];
        pread_aligned_handle_holes(handle, &mut tmp, left_blk_num * bsz, bs).await?;
        buf[0..read_count as usize]
            .copy_from_slice(&tmp[left_bytes as usize..left_bytes as usize + read_count as usize]);

        if count <= right_bytes {
            return Ok(());
        }

        count -= read_count;
        offset += read_count;
        buf_pos = read_count;
    }

    let cont_blk_count = count / bsz;
    if cont_blk_count > 0 {
        let span = (cont_blk_count * bsz) as usize;
        pread_aligned_handle_holes(
            handle,
            &mut buf[buf_pos as usize..buf_pos as usize + span],
            offset,
            bs,
        )
        .await?;

        count -= cont_blk_count * bsz;
        offset += cont_blk_count * bsz;
        buf_pos += cont_blk_count * bsz;
    }

    if count == 0 {
        return Ok(());
    }

    let mut tmp = vec![0u8; bs as usize];
    pread_aligned_handle_holes(handle, &mut tmp, offset, bs).await?;
    buf[buf_pos as usize..buf_pos as usize + count as usize]
        .copy_from_slice(&tmp[0..count as usize]);

    Ok(())
}
