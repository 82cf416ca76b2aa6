//! Sequential traversal of live records.

use crate::FifoSlab;
use std::iter::FusedIterator;

/// Position of a caller-driven traversal over a [FifoSlab], advanced by
/// [FifoSlab::peek_item_iter].
///
/// A cursor is a detached pair of offsets relative to the slab's read position. It is only
/// meaningful until the next push or pop on the slab it was used with: after a mutation it
/// may yield the wrong records or stop early (but never reads outside the live region).
/// Start a new traversal with [Cursor::default].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cursor {
    /// Items advanced past the first live item.
    item: usize,

    /// Bytes advanced past the read position.
    offset: usize,
}

impl Cursor {
    /// Number of items this cursor has yielded.
    pub const fn item(&self) -> usize {
        self.item
    }

    /// Bytes (including padding) between the read position and the next item.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn advance(&mut self, aligned: usize) {
        self.item += 1;
        self.offset += aligned;
    }
}

/// Iterator over the live records of a [FifoSlab], oldest first.
///
/// Created by [FifoSlab::iter]. Each item is the record's original (unpadded) bytes.
pub struct Iter<'a> {
    slab: &'a FifoSlab,
    cursor: Cursor,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(slab: &'a FifoSlab) -> Self {
        Self {
            slab,
            cursor: Cursor::default(),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.slab.peek_item_iter(&mut self.cursor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.slab.item_count() - self.cursor.item;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a FifoSlab {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
