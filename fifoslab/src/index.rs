//! Per-record metadata stored alongside the arena.

use crate::{Error, ALIGNMENT};
use tracing::debug;

/// Footprint of a single record in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Entry {
    /// Bytes occupied in the arena, including padding.
    aligned: usize,

    /// Zero bytes appended after the payload.
    padding: u8,
}

const _: () = assert!(ALIGNMENT - 1 <= u8::MAX as usize);

impl Entry {
    /// Describes a record of `len` payload bytes stored in `aligned` bytes.
    pub fn new(len: usize, aligned: usize) -> Self {
        let padding = aligned - len;
        debug_assert!(padding < ALIGNMENT);
        Self {
            aligned,
            padding: padding as u8,
        }
    }

    pub const fn aligned(&self) -> usize {
        self.aligned
    }

    /// Length of the payload as originally pushed (less any prefix consumed by a raw pop).
    pub const fn original(&self) -> usize {
        self.aligned.saturating_sub(self.padding as usize)
    }
}

/// Growable sequence of [Entry]s with a read cursor.
///
/// The live entries are `entries[read..]`. Capacity doubles when full and is never released.
pub(crate) struct Index {
    entries: Vec<Entry>,

    /// Number of entries consumed from the front.
    ///
    /// Invariant: `read <= entries.len()`
    read: usize,

    /// Number of slots available before the next doubling.
    ///
    /// Invariant: `entries.len() <= capacity`
    capacity: usize,
}

impl Index {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "index capacity must be greater than 0");
        Self {
            entries: Vec::with_capacity(capacity),
            read: 0,
            capacity,
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Absolute position of the first live entry.
    pub const fn read(&self) -> usize {
        self.read
    }

    /// Absolute position one past the last live entry.
    pub fn write(&self) -> usize {
        self.entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len() - self.read
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ensures one more entry can be pushed, doubling the capacity if the index is full.
    ///
    /// Returns whether the index was reallocated.
    pub fn ensure_capacity(&mut self) -> Result<bool, Error> {
        if self.entries.len() < self.capacity {
            return Ok(false);
        }
        let capacity = doubled(self.capacity)?;
        self.entries.try_reserve_exact(capacity - self.entries.len())?;
        debug!(old = self.capacity, new = capacity, "grew index");
        self.capacity = capacity;
        Ok(true)
    }

    /// Appends an entry.
    ///
    /// # Panics
    ///
    /// Panics if capacity was not reserved with [Index::ensure_capacity].
    pub fn push(&mut self, entry: Entry) {
        assert!(self.entries.len() < self.capacity, "index capacity not reserved");
        self.entries.push(entry);
    }

    /// Returns the `n`-th live entry.
    pub fn get(&self, n: usize) -> Option<&Entry> {
        self.entries.get(self.read.checked_add(n)?)
    }

    /// Returns the number of arena bytes occupied by the first `n` live entries.
    pub fn offset_of(&self, n: usize) -> usize {
        self.entries[self.read..self.read + n]
            .iter()
            .map(Entry::aligned)
            .sum()
    }

    /// Removes and returns the first live entry.
    pub fn pop_front(&mut self) -> Option<Entry> {
        let entry = *self.entries.get(self.read)?;
        self.read += 1;
        Some(entry)
    }

    /// Accounts for `len` bytes consumed from the front of the arena.
    ///
    /// Entries fully covered by `len` are consumed. An entry that is only partially covered
    /// shrinks in place (its padding is left as-is) and remains the first live entry.
    pub fn consume(&mut self, len: usize) {
        let mut remaining = len;
        while remaining > 0 {
            let Some(entry) = self.entries.get_mut(self.read) else {
                break;
            };
            if entry.aligned <= remaining {
                remaining -= entry.aligned;
                self.read += 1;
            } else {
                entry.aligned -= remaining;
                remaining = 0;
            }
        }
        debug_assert_eq!(remaining, 0, "consumed past last entry");
    }

    /// Drops every entry, keeping capacity.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.read = 0;
    }
}

/// Returns the slot count after doubling a full index of `capacity` slots.
fn doubled(capacity: usize) -> Result<usize, Error> {
    capacity.checked_mul(2).ok_or(Error::IndexOverflow {
        requested: capacity.saturating_add(1),
    })
}
