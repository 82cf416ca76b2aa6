use commonware_utils::NZUsize;
use criterion::criterion_main;
use fifoslab::FifoSlab;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use std::num::NonZeroUsize;


criterion_main!(push_pop::benches, iterate::benches);

/// Initial arena capacity for every benchmark. Small enough that growth is exercised.
const INITIAL_CAPACITY: NonZeroUsize = NZUsize!(4096);

/// Generate `count` random records of up to `max_len` bytes.
fn random_records(count: usize, max_len: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..count)
        .map(|_| {
            let mut record = vec![0; rng.gen_range(1..=max_len)];
            rng.fill_bytes(&mut record);
            record
        })
        .collect()
}

/// Return a slab holding every record in `records`.
fn filled_slab(records: &[Vec<u8>]) -> FifoSlab {
    let mut slab = FifoSlab::new(INITIAL_CAPACITY);
    for record in records {
        slab.push(record);
    }
    slab
}
