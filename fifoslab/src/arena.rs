//! Contiguous byte storage for record payloads.
//!
//! The arena is partitioned by two cursors: bytes in `[0, read_pos)` have been consumed, bytes in
//! `[read_pos, write_pos)` are live, and bytes in `[write_pos, size)` are free for future writes.

use crate::{checked_align_up, Error, ALIGNMENT};
use std::slice;
use tracing::debug;

/// Unit of allocation.
///
/// Backing the arena with blocks instead of bytes keeps its base address aligned to [ALIGNMENT].
#[derive(Clone, Copy)]
#[repr(C, align(16))]
struct Block([u8; ALIGNMENT]);

const _: () = assert!(core::mem::size_of::<Block>() == ALIGNMENT);
const _: () = assert!(core::mem::align_of::<Block>() == ALIGNMENT);

/// Block with every byte set to 0.
const EMPTY_BLOCK: Block = Block([0; ALIGNMENT]);

/// Growable, aligned byte region with read and write cursors.
pub(crate) struct Arena {
    /// Backing storage. Always holds at least `size` bytes.
    blocks: Vec<Block>,

    /// Logical capacity in bytes. Only ever doubles.
    size: usize,

    /// Offset of the first unread byte.
    ///
    /// Invariant: `read_pos <= write_pos`
    read_pos: usize,

    /// Offset of the first free byte.
    ///
    /// Invariant: `write_pos <= size`
    write_pos: usize,
}

impl Arena {
    /// Allocates an arena able to hold `size` bytes before growing.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "arena size must be greater than 0");
        Self {
            blocks: vec![EMPTY_BLOCK; size.div_ceil(ALIGNMENT)],
            size,
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Logical capacity in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    pub const fn read_pos(&self) -> usize {
        self.read_pos
    }

    pub const fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Number of unread bytes (including padding).
    pub const fn len(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Returns true if every written byte has been read.
    pub const fn is_drained(&self) -> bool {
        self.read_pos == self.write_pos
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: `Block` is a `repr(C)` wrapper around `[u8; ALIGNMENT]` with no padding (asserted
        // above), so `blocks` is a contiguous run of `blocks.len() * ALIGNMENT` initialized bytes.
        unsafe {
            slice::from_raw_parts(
                self.blocks.as_ptr().cast::<u8>(),
                self.blocks.len() * ALIGNMENT,
            )
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: see `bytes`. The exclusive borrow of `self` guarantees no other view exists.
        unsafe {
            slice::from_raw_parts_mut(
                self.blocks.as_mut_ptr().cast::<u8>(),
                self.blocks.len() * ALIGNMENT,
            )
        }
    }

    /// Returns `len` live bytes starting `offset` bytes past the read cursor.
    ///
    /// Returns `None` if the requested range extends past the write cursor.
    pub fn live(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        let start = self.read_pos + offset;
        Some(&self.bytes()[start..start + len])
    }

    /// Ensures that `additional` bytes can be written without exceeding capacity, doubling the
    /// capacity as many times as needed.
    ///
    /// Returns whether the arena was reallocated. Bytes in `[0, write_pos)` are preserved.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<bool, Error> {
        let overflow = Error::CapacityOverflow {
            requested: additional,
        };
        let Some(required) = self.write_pos.checked_add(additional) else {
            return Err(overflow);
        };
        if required <= self.size {
            return Ok(false);
        }

        // Double until the write fits
        let mut size = self.size;
        while size < required {
            let Some(doubled) = size.checked_mul(2) else {
                return Err(overflow);
            };
            size = doubled;
        }

        // Reserve before touching any state so a failed allocation leaves the arena intact
        let blocks = size.div_ceil(ALIGNMENT);
        self.blocks.try_reserve_exact(blocks - self.blocks.len())?;
        self.blocks.resize(blocks, EMPTY_BLOCK);
        debug!(old = self.size, new = size, "grew arena");
        self.size = size;
        Ok(true)
    }

    /// Copies `data` to the write cursor, zero-fills the padding up to the next [ALIGNMENT]
    /// boundary, and advances the write cursor past both.
    ///
    /// Returns the aligned length written.
    ///
    /// # Panics
    ///
    /// Panics if capacity was not reserved with [Arena::ensure_capacity].
    pub fn write(&mut self, data: &[u8]) -> usize {
        let aligned = checked_align_up(data.len()).expect("aligned length overflows usize");
        let start = self.write_pos;
        let end = start + aligned;
        assert!(end <= self.size, "arena capacity not reserved");

        let region = &mut self.bytes_mut()[start..end];
        let (payload, padding) = region.split_at_mut(data.len());
        payload.copy_from_slice(data);
        padding.fill(0);

        self.write_pos = end;
        aligned
    }

    /// Advances the read cursor by `len` bytes.
    pub fn consume(&mut self, len: usize) {
        assert!(len <= self.len(), "consumed past write cursor");
        self.read_pos += len;
    }

    /// Rewinds both cursors to offset zero, keeping capacity.
    pub fn reset(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align_up;

    #[test]
    fn test_write_pads_with_zeroes() {
        let mut arena = Arena::new(64);

        // Dirty the region so stale bytes would show through missing padding
        assert!(!arena.ensure_capacity(32).unwrap());
        arena.write(&[0xFF; 32]);
        arena.consume(32);
        arena.reset();

        let written = arena.write(b"abc");
        assert_eq!(written, ALIGNMENT);
        assert_eq!(arena.write_pos(), ALIGNMENT);
        let view = arena.live(0, ALIGNMENT).unwrap();
        assert_eq!(&view[..3], b"abc");
        assert!(view[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_base_is_aligned() {
        for size in [1, 7, 16, 100, 4096] {
            let mut arena = Arena::new(size);
            arena.ensure_capacity(align_up(1)).unwrap();
            arena.write(&[1]);
            let view = arena.live(0, 1).unwrap();
            assert_eq!(view.as_ptr() as usize % ALIGNMENT, 0);
        }
    }

    #[test]
    fn test_ensure_capacity_doubles() {
        let mut arena = Arena::new(24);

        // Fits without growth
        assert!(!arena.ensure_capacity(16).unwrap());
        arena.write(&[7; 16]);

        // 16 + 16 > 24 -> 48
        assert!(arena.ensure_capacity(16).unwrap());
        assert_eq!(arena.size(), 48);

        // 16 + 200 -> 48 -> 96 -> 192 -> 384
        assert!(arena.ensure_capacity(200).unwrap());
        assert_eq!(arena.size(), 384);

        // Existing bytes survive reallocation
        assert_eq!(arena.live(0, 16).unwrap(), &[7; 16]);
    }

    #[test]
    fn test_ensure_capacity_overflow() {
        let mut arena = Arena::new(16);
        arena.ensure_capacity(16).unwrap();
        arena.write(&[0; 16]);

        let err = arena.ensure_capacity(usize::MAX).unwrap_err();
        assert!(matches!(err, Error::CapacityOverflow { requested } if requested == usize::MAX));

        // Doubling 16 past usize::MAX / 2 + 1 overflows
        let err = arena.ensure_capacity(usize::MAX - 16).unwrap_err();
        assert!(matches!(err, Error::CapacityOverflow { .. }));

        // Nothing changed
        assert_eq!(arena.size(), 16);
        assert_eq!(arena.write_pos(), 16);
    }

    #[test]
    fn test_live_bounds() {
        let mut arena = Arena::new(64);
        arena.ensure_capacity(align_up(5)).unwrap();
        arena.write(b"hello");

        assert_eq!(arena.live(0, 5).unwrap(), b"hello");
        assert_eq!(arena.live(0, 16).unwrap().len(), 16);
        assert!(arena.live(0, 17).is_none());
        assert!(arena.live(16, 1).is_none());
        assert!(arena.live(usize::MAX, 1).is_none());
        assert_eq!(arena.live(16, 0).unwrap().len(), 0);

        arena.consume(2);
        assert_eq!(arena.live(0, 3).unwrap(), b"llo");
        assert_eq!(arena.len(), 14);
    }

    #[test]
    #[should_panic(expected = "arena capacity not reserved")]
    fn test_write_without_reserve() {
        let mut arena = Arena::new(8);
        arena.write(&[0; 9]);
    }
}
