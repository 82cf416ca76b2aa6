use commonware_utils::NZUsize;
use fifoslab::{align_up, Config, Cursor, FifoSlab, ALIGNMENT, DEFAULT_INDEX_CAPACITY};

fn slab(capacity: usize) -> FifoSlab {
    FifoSlab::new(NZUsize!(capacity))
}

/// Length-prefixed frames pushed as records and read back through raw byte pops.
#[test]
fn framed_stream_round_trip() {
    let payloads: Vec<Vec<u8>> = (1..=32u8).map(|i| vec![i; i as usize * 3]).collect();

    let mut slab = slab(64);
    for payload in &payloads {
        let mut frame = (payload.len() as u32).to_le_bytes().to_vec();
        frame.extend_from_slice(payload);
        slab.push(&frame);
    }

    for payload in &payloads {
        // Read the header and body of the next frame from the raw stream
        let header = slab.peek(4).unwrap();
        let len = u32::from_le_bytes(header.try_into().unwrap()) as usize;
        assert_eq!(len, payload.len());
        let frame = slab.peek(4 + len).unwrap();
        assert_eq!(&frame[4..], payload.as_slice());

        // Skip the frame and its padding
        let footprint = align_up(4 + len);
        assert_eq!(slab.pop(footprint), footprint);
    }
    assert!(slab.is_empty());
    assert_eq!(slab.peek_size(), 0);
}

#[test]
fn raw_pop_of_first_record_exposes_second() {
    let mut slab = slab(64);
    slab.push(b"first record");
    slab.push(b"second");

    assert_eq!(slab.pop(align_up(12)), align_up(12));
    assert_eq!(slab.item_count(), 1);
    assert_eq!(slab.peek_item(0).unwrap(), b"second");
}

#[test]
fn mixed_granularity_consumers() {
    let mut slab = slab(16);
    let records: [&[u8]; 4] = [b"a", b"bbbbbbbbbbbbbbbbbbbb", b"ccc", b"dddddddd"];
    for record in records {
        slab.push(record);
    }

    // Byte-level consumer takes 3 bytes of the first record's footprint
    assert_eq!(slab.pop(3), 3);
    assert_eq!(slab.peek_item(0).unwrap(), b"");

    // Item-level consumer drops what is left of it
    assert_eq!(slab.pop_item(), Some(0));
    assert_eq!(slab.peek_size(), align_up(20) + align_up(3) + align_up(8));

    let mut cursor = Cursor::default();
    let mut seen = Vec::new();
    while let Some(item) = slab.peek_item_iter(&mut cursor) {
        assert_eq!(item.as_ptr() as usize % ALIGNMENT, 0);
        seen.push(item.to_vec());
    }
    assert_eq!(seen, records[1..].iter().map(|r| r.to_vec()).collect::<Vec<_>>());

    // Drain through a mix of raw and item pops
    assert_eq!(slab.pop(align_up(20) + 1), align_up(20) + 1);
    assert_eq!(slab.peek_item(0).unwrap(), b"cc");
    assert_eq!(slab.pop_item(), Some(2));
    assert_eq!(slab.pop(align_up(8)), align_up(8));
    assert!(slab.is_empty());
}

#[test]
fn repeated_epochs_reuse_capacity() {
    let mut slab = FifoSlab::init(Config {
        initial_capacity: NZUsize!(32),
        index_capacity: DEFAULT_INDEX_CAPACITY,
    });

    // First epoch establishes the high-water mark
    for i in 0..8u8 {
        slab.push(&[i; 24]);
    }
    let capacity = slab.capacity();
    while slab.pop_item().is_some() {}

    // Later epochs of the same size never grow
    for epoch in 0..100u8 {
        for i in 0..8u8 {
            slab.push(&[epoch ^ i; 24]);
        }
        for i in 0..8u8 {
            assert_eq!(slab.peek_item(0).unwrap(), &[epoch ^ i; 24]);
            assert_eq!(slab.pop_item(), Some(24));
        }
        assert_eq!(slab.capacity(), capacity);
        assert_eq!(slab.peek_size(), 0);
    }
}
