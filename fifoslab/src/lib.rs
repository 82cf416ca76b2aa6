//! Queue variable-length records in a single contiguous, aligned arena.
//!
//! A [FifoSlab] stores opaque byte records back-to-back in one growable arena and keeps a
//! parallel index of each record's footprint. Records can be consumed either as raw byte
//! ranges ([FifoSlab::peek], [FifoSlab::pop]), which ignore record boundaries, or as whole
//! items ([FifoSlab::peek_item], [FifoSlab::pop_item], [FifoSlab::peek_item_iter]).
//!
//! # Layout
//!
//! Every record is padded with zeroes to a multiple of [ALIGNMENT] bytes, and the arena base is
//! itself aligned to [ALIGNMENT], so any record that has not been split by a raw pop starts at
//! an address suitable for reinterpreting plain-old-data in place. Item operations always report
//! the original (unpadded) length of a record; [FifoSlab::peek_size] reports the padded footprint.
//!
//! # Growth
//!
//! The arena and the index each double in capacity when an append does not fit. Capacity is
//! never released while the slab is alive. Instead, whenever a pop leaves nothing unread, all
//! cursors rewind to offset zero so the same memory is reused by the next push.
//!
//! # Status
//!
//! `fifoslab` is **ALPHA** software and is not yet recommended for production use. Developers
//! should expect breaking changes and occasional instability.

use std::collections::TryReserveError;
use thiserror::Error;

mod arena;
mod index;
mod iter;
pub use iter::{Cursor, Iter};
mod metrics;
mod slab;
pub use slab::{Config, FifoSlab, DEFAULT_INDEX_CAPACITY};

/// Alignment (in bytes) of the arena base and of every record stored in it.
///
/// This is at least the alignment of every fundamental scalar type.
pub const ALIGNMENT: usize = 16;

const _: () = assert!(ALIGNMENT.is_power_of_two());
const _: () = assert!(ALIGNMENT >= core::mem::align_of::<u128>());
const _: () = assert!(ALIGNMENT >= core::mem::align_of::<f64>());
const _: () = assert!(ALIGNMENT >= core::mem::align_of::<usize>());

/// Errors that can occur when growing a [FifoSlab].
#[derive(Debug, Error)]
pub enum Error {
    #[error("capacity overflow while reserving {requested} bytes")]
    CapacityOverflow { requested: usize },
    #[error("index overflow while reserving {requested} slots")]
    IndexOverflow { requested: usize },
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Rounds `len` up to the next multiple of [ALIGNMENT].
///
/// # Panics
///
/// Panics if the result does not fit in a `usize`.
pub const fn align_up(len: usize) -> usize {
    match checked_align_up(len) {
        Some(aligned) => aligned,
        None => panic!("aligned length overflows usize"),
    }
}

/// Rounds `len` up to the next multiple of [ALIGNMENT], returning `None` on overflow.
pub(crate) const fn checked_align_up(len: usize) -> Option<usize> {
    match len.checked_add(ALIGNMENT - 1) {
        Some(padded) => Some(padded & !(ALIGNMENT - 1)),
        None => None,
    }
}
