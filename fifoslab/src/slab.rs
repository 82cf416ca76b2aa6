//! The [FifoSlab] queue.

use crate::{
    arena::Arena,
    checked_align_up,
    index::{Entry, Index},
    metrics::Metrics,
    Cursor, Error, Iter,
};
use commonware_utils::NZUsize;
use prometheus_client::registry::Registry;
use std::{fmt, num::NonZeroUsize};
use tracing::trace;

/// Number of index slots allocated by [Config::new].
pub const DEFAULT_INDEX_CAPACITY: NonZeroUsize = NZUsize!(64);

/// Configuration for [FifoSlab].
#[derive(Clone, Debug)]
pub struct Config {
    /// Initial arena capacity in bytes.
    ///
    /// The arena doubles from this value whenever a push does not fit.
    pub initial_capacity: NonZeroUsize,

    /// Initial number of index slots (one per live record).
    ///
    /// The index doubles from this value independently of the arena.
    pub index_capacity: NonZeroUsize,
}

impl Config {
    /// Returns a configuration with the given arena capacity and the default index capacity.
    pub const fn new(initial_capacity: NonZeroUsize) -> Self {
        Self {
            initial_capacity,
            index_capacity: DEFAULT_INDEX_CAPACITY,
        }
    }
}

/// A FIFO queue of variable-length byte records stored back-to-back in one contiguous arena.
///
/// # Access
///
/// Records can be read two ways, and both may be mixed freely:
/// - Raw byte ranges: [FifoSlab::peek] and [FifoSlab::pop] operate on the unread bytes (padding
///   included) without regard for record boundaries. Popping part of a record leaves the rest of
///   it at the front of the queue as a shorter record.
/// - Items: [FifoSlab::peek_item], [FifoSlab::pop_item], [FifoSlab::peek_item_iter] and
///   [FifoSlab::iter] operate on whole records and report their original (unpadded) lengths.
///
/// # Views
///
/// Every view returned by a peek borrows the slab, so it cannot outlive the next push or pop
/// (which may reallocate the arena). [Cursor]s are the exception: they are plain values and must
/// be discarded by the caller after any mutation.
///
/// # Compaction
///
/// When a pop leaves no unread bytes and no live records, all cursors rewind to zero and the next
/// push reuses the arena from its start. Capacity is never released. A queued empty record counts
/// as live, so it holds the cursors in place until it is popped.
///
/// # Concurrency
///
/// A slab has a single owner. Sharing one across threads requires external synchronization.
pub struct FifoSlab {
    arena: Arena,
    index: Index,
    metrics: Metrics,
}

impl FifoSlab {
    /// Creates an empty slab whose arena can hold `initial_capacity` bytes before growing.
    pub fn new(initial_capacity: NonZeroUsize) -> Self {
        Self::init(Config::new(initial_capacity))
    }

    /// Creates an empty slab from the given configuration.
    pub fn init(cfg: Config) -> Self {
        let slab = Self {
            arena: Arena::new(cfg.initial_capacity.get()),
            index: Index::new(cfg.index_capacity.get()),
            metrics: Metrics::default(),
        };
        slab.metrics.capacity.set(slab.arena.size() as i64);
        slab
    }

    /// Registers the slab's metrics with `registry`.
    pub fn register(&self, registry: &mut Registry) {
        self.metrics.register(registry);
    }

    /// Appends a copy of `data` as a new record.
    ///
    /// The record occupies [crate::align_up]`(data.len())` bytes of the arena; the trailing padding
    /// is zeroed. Empty records are allowed.
    ///
    /// # Panics
    ///
    /// Panics if the arena or the index cannot grow to fit the record (see [FifoSlab::try_push]).
    pub fn push(&mut self, data: &[u8]) {
        if let Err(err) = self.try_push(data) {
            panic!("failed to push {} bytes: {err}", data.len());
        }
    }

    /// Appends a copy of `data` as a new record.
    ///
    /// Every push is tracked as an item, so this is equivalent to [FifoSlab::push]. It exists to
    /// pair with [FifoSlab::pop_item] at call sites that only deal in whole records.
    pub fn push_item(&mut self, data: &[u8]) {
        self.push(data);
    }

    /// Appends a copy of `data` as a new record, returning an error instead of panicking if the
    /// slab cannot grow to fit it.
    ///
    /// # Errors
    ///
    /// - Returns [Error::CapacityOverflow] if the grown arena size would not fit in a `usize`.
    /// - Returns [Error::IndexOverflow] if the grown index slot count would not fit in a `usize`.
    /// - Returns [Error::Allocation] if the allocator cannot provide the grown buffer.
    ///
    /// On error, no record is added. A buffer grown before the failure keeps its new capacity.
    pub fn try_push(&mut self, data: &[u8]) -> Result<(), Error> {
        let Some(aligned) = checked_align_up(data.len()) else {
            return Err(Error::CapacityOverflow {
                requested: data.len(),
            });
        };

        // Reserve in both buffers before writing to either
        if self.index.ensure_capacity()? {
            self.metrics.grows.inc();
        }
        if self.arena.ensure_capacity(aligned)? {
            self.metrics.grows.inc();
            self.metrics.capacity.set(self.arena.size() as i64);
        }

        self.arena.write(data);
        self.index.push(Entry::new(data.len(), aligned));
        self.update_gauges();
        Ok(())
    }

    /// Returns the number of unread bytes, including padding.
    pub const fn peek_size(&self) -> usize {
        self.arena.len()
    }

    /// Returns the first `requested_len` unread bytes without consuming them.
    ///
    /// Returns `None` if `requested_len` is 0 or more than [FifoSlab::peek_size]. The view may
    /// span several records (and their padding) or end in the middle of one.
    pub fn peek(&self, requested_len: usize) -> Option<&[u8]> {
        if requested_len == 0 {
            return None;
        }
        self.arena.live(0, requested_len)
    }

    /// Consumes `requested_len` bytes from the front of the queue.
    ///
    /// Returns `requested_len`, or 0 (consuming nothing) if [FifoSlab::peek] would return `None`
    /// for the same length.
    ///
    /// Records wholly covered by the popped range are removed. A record that is only partially
    /// covered stays at the front of the queue, shortened by the number of bytes popped from it.
    ///
    /// Empty records queued right after the popped range are not removed. While any remain, the
    /// slab does not rewind, so the next push lands after the bytes already consumed.
    pub fn pop(&mut self, requested_len: usize) -> usize {
        if self.peek(requested_len).is_none() {
            return 0;
        }
        self.arena.consume(requested_len);
        self.index.consume(requested_len);
        self.compact();
        self.update_gauges();
        requested_len
    }

    /// Returns the number of live records.
    pub fn item_count(&self) -> usize {
        self.index.len()
    }

    /// Returns true if there are no live records.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the `n`-th live record (0 is the oldest) without consuming it.
    ///
    /// The returned view has the record's original (unpadded) length. Returns `None` if `n` is not
    /// less than [FifoSlab::item_count].
    ///
    /// This walks the first `n` records to locate the `n`-th, so traversing every record this way
    /// is quadratic. Use [FifoSlab::iter] or [FifoSlab::peek_item_iter] instead.
    pub fn peek_item(&self, n: usize) -> Option<&[u8]> {
        let entry = self.index.get(n)?;
        let offset = self.index.offset_of(n);
        self.arena.live(offset, entry.original())
    }

    /// Returns the record at `cursor` and advances `cursor` to the next record.
    ///
    /// Returns `None` (leaving `cursor` untouched) once every live record has been visited. Each
    /// call is O(1).
    ///
    /// `cursor` must not be reused across a push or pop on this slab; see [Cursor].
    pub fn peek_item_iter(&self, cursor: &mut Cursor) -> Option<&[u8]> {
        let entry = self.index.get(cursor.item())?;
        let view = self.arena.live(cursor.offset(), entry.original())?;
        cursor.advance(entry.aligned());
        Some(view)
    }

    /// Returns an iterator over the live records, oldest first.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// Removes the oldest record, returning its original (unpadded) length.
    ///
    /// Returns `None` if there are no live records.
    pub fn pop_item(&mut self) -> Option<usize> {
        let entry = self.index.pop_front()?;
        self.arena.consume(entry.aligned());
        self.compact();
        self.update_gauges();
        Some(entry.original())
    }

    /// Removes every record, keeping capacity.
    pub fn clear(&mut self) {
        self.arena.reset();
        self.index.reset();
        self.update_gauges();
    }

    /// Returns the arena capacity in bytes.
    pub const fn capacity(&self) -> usize {
        self.arena.size()
    }

    /// Returns the number of index slots.
    pub const fn index_capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Rewinds both buffers once nothing is left to read.
    fn compact(&mut self) {
        if !self.arena.is_drained() || !self.index.is_empty() {
            return;
        }
        self.arena.reset();
        self.index.reset();
        self.metrics.compactions.inc();
        trace!("drained slab");
    }

    fn update_gauges(&self) {
        self.metrics.items.set(self.index.len() as i64);
        self.metrics.bytes.set(self.arena.len() as i64);
    }
}

impl fmt::Debug for FifoSlab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoSlab")
            .field("read_pos", &self.arena.read_pos())
            .field("write_pos", &self.arena.write_pos())
            .field("capacity", &self.arena.size())
            .field("index_read", &self.index.read())
            .field("index_write", &self.index.write())
            .field("index_capacity", &self.index.capacity())
            .finish()
    }
}
