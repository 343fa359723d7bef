//! The IO buffer / IO vector / extent vector data model (C1).
//!
//! With no FFI boundary to cross, an `IoVec` is a `Vec` of small buffer
//! structs, each owning a `BytesMut` (so the backend can read into or write
//! out of it without a raw-pointer aliasing story); the façade copies once
//! at the public `pread`/`pwrite` boundary where the caller's `&mut [u8]`
//! lives. `IoVec::take` implements a "move" operation used to hand buffers
//! into a backend-private wrapper without double ownership.

use bitflags::bitflags;
use bytes::BytesMut;

bitflags! {
    /// At minimum distinguishes data-bearing IO (READ/WRITE) from
    /// data-less IO (FREE/trim-style).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IoVecFlags: u32 {
        const HAS_DATA = 0b01;
        const NO_DATA  = 0b10;
    }
}

/// A single (offset, size) extent with no data payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub offset: u64,
    pub size: u64,
}

/// A contiguous buffer targeting a byte range within an object.
///
/// Invariant: `size() > 0`. `offset` is unsigned, so non-negativity is
/// enforced by the type itself.
#[derive(Debug)]
pub struct IoBuffer {
    pub data: BytesMut,
    pub offset: u64,
}

impl IoBuffer {
    pub fn new(data: BytesMut, offset: u64) -> Self {
        debug_assert!(!data.is_empty(), "IoBuffer size must be positive");
        Self { data, offset }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A batch of [`IoBuffer`]s plus a flags field, analogous to the C
/// original's three parallel arrays and `nr` count.
#[derive(Debug, Default)]
pub struct IoVec {
    bufs: Vec<IoBuffer>,
    pub flags: IoVecFlags,
}

impl IoVec {
    pub fn new(bufs: Vec<IoBuffer>, flags: IoVecFlags) -> Self {
        let vec = Self { bufs, flags };
        debug_assert!(vec.invariant());
        vec
    }

    /// Build a single-buffer IO vector from one buffer, the common case
    /// used by the aligned IO primitives (C5).
    pub fn from_single(buf: IoBuffer) -> Self {
        Self::new(vec![buf], IoVecFlags::HAS_DATA)
    }

    pub fn nr(&self) -> usize {
        self.bufs.len()
    }

    pub fn bufs(&self) -> &[IoBuffer] {
        &self.bufs
    }

    pub fn bufs_mut(&mut self) -> &mut [IoBuffer] {
        &mut self.bufs
    }

    pub fn into_bufs(self) -> Vec<IoBuffer> {
        self.bufs
    }

    /// Transfers ownership of the underlying arrays to a new vector,
    /// leaving an empty (but well-formed-looking) vector behind. Used to
    /// hand buffers from the user-visible vector into a backend-private
    /// wrapper that must not separately free them.
    pub fn take(&mut self) -> IoVec {
        std::mem::replace(self, IoVec::new(Vec::new(), self.flags))
    }

    pub fn as_extents(&self) -> ExtentVec {
        ExtentVec {
            extents: self
                .bufs
                .iter()
                .map(|b| Extent {
                    offset: b.offset,
                    size: b.size() as u64,
                })
                .collect(),
        }
    }

    /// Debug-assertable invariant: well-formed vectors have at least one
    /// buffer and every buffer has a strictly positive size. An empty
    /// vector (as produced by [`IoVec::take`] on a drained source) is
    /// still considered well-formed-for-emptiness, i.e. this predicate is
    /// only meaningful before a vector is handed to `io_op_init`.
    pub fn invariant(&self) -> bool {
        self.bufs.iter().all(|b| b.size() > 0)
    }
}

/// A vector of (offset, size) pairs only, used for `FREE`-style IO with no
/// data payload.
#[derive(Debug, Default, Clone)]
pub struct ExtentVec {
    pub extents: Vec<Extent>,
}

impl ExtentVec {
    pub fn new(extents: Vec<Extent>) -> Self {
        Self { extents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(n: usize, offset: u64) -> IoBuffer {
        IoBuffer::new(BytesMut::from(vec![0u8; n].as_slice()), offset)
    }

    #[test]
    fn single_buffer_vec_has_data_flag() {
        let vec = IoVec::from_single(buf(4096, 0));
        assert_eq!(vec.nr(), 1);
        assert!(vec.flags.contains(IoVecFlags::HAS_DATA));
        assert!(vec.invariant());
    }

    #[test]
    fn take_drains_source() {
        let mut vec = IoVec::from_single(buf(4096, 0));
        let moved = vec.take();
        assert_eq!(moved.nr(), 1);
        assert_eq!(vec.nr(), 0);
    }

    #[test]
    fn as_extents_mirrors_offsets_and_sizes() {
        let vec = IoVec::new(vec![buf(100, 10), buf(50, 200)], IoVecFlags::HAS_DATA);
        let extents = vec.as_extents();
        assert_eq!(extents.extents[0], Extent { offset: 10, size: 100 });
        assert_eq!(extents.extents[1], Extent { offset: 200, size: 50 });
    }
}
