//! Resize / shrink (C8).
//!
//! Growing (or no-op) resizes do nothing: the newly visible range reads as
//! zero through ordinary hole semantics. Shrinking actively zero-fills
//! `[new_size, old_size)` in chunks bounded by `MAX_IO`, since the backend
//! ABI this crate targets has no dedicated "deallocate a range" operation
//! to call instead.

use crate::error::Result;
use crate::io::pwrite;
use crate::object::ObjectHandle;

/// The largest single zero-fill write issued while shrinking.
const MAX_IO: u64 = 1024 * 1024;

pub async fn resize(handle: &ObjectHandle, old_size: u64, new_size: u64, bs: u32) -> Result<()> {
    if old_size <= new_size {
        return Ok(());
    }
    shrink(handle, old_size, new_size, bs).await
}

async fn shrink(handle: &ObjectHandle, old_size: u64, new_size: u64, bs: u32) -> Result<()> {
    let count = old_size - new_size;
    let nr_full_chunks = count / MAX_IO;
    let tail_size = count - nr_full_chunks * MAX_IO;

    let zeros = vec![0u8; MAX_IO as usize];

    for index in 0..nr_full_chunks {
        let chunk_offset = new_size + index * MAX_IO;
        pwrite(handle, chunk_offset, &zeros, bs).await?;
    }

    if tail_size > 0 {
        let tail_offset = new_size + nr_full_chunks * MAX_IO;
        pwrite(handle, tail_offset, &zeros[..tail_size as usize], bs).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::MAX_IO;

    #[test]
    fn max_io_is_one_mebibyte() {
        assert_eq!(MAX_IO, 1024 * 1024);
    }
}
