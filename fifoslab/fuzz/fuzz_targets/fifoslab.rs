#![no_main]

use arbitrary::Arbitrary;
use commonware_utils::NZUsize;
use fifoslab::{align_up, Config, Cursor, FifoSlab};
use libfuzzer_sys::fuzz_target;
use std::collections::VecDeque;

/// Largest record pushed in a single operation.
const MAX_PUSH: usize = 4096;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    initial_capacity: u16,
    index_capacity: u8,
    operations: Vec<Operation>,
}

#[derive(Arbitrary, Debug)]
enum Operation {
    Push(Vec<u8>),
    Pop(u16),
    PopItem,
    Peek(u16),
    PeekItem(u8),
    PeekSize,
    ItemCount,
    Iterate,
    Clear,
}

/// Unread bytes of each record (payload then remaining padding), oldest first.
#[derive(Default)]
struct Model {
    records: VecDeque<(Vec<u8>, usize)>,
}

impl Model {
    fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (data, padding) in &self.records {
            bytes.extend_from_slice(data);
            bytes.resize(bytes.len() + padding, 0);
        }
        bytes
    }

    fn pop(&mut self, len: usize) {
        let mut remaining = len;
        while remaining > 0 {
            let (data, padding) = self.records.front_mut().unwrap();
            let footprint = data.len() + *padding;
            if footprint <= remaining {
                remaining -= footprint;
                self.records.pop_front();
            } else if remaining <= data.len() {
                data.drain(..remaining);
                remaining = 0;
            } else {
                *padding -= remaining - data.len();
                data.clear();
                remaining = 0;
            }
        }
    }
}

fn fuzz(input: FuzzInput) {
    let initial_capacity = NZUsize!(input.initial_capacity as usize + 1);
    let index_capacity = NZUsize!(input.index_capacity as usize + 1);
    let mut slab = FifoSlab::init(Config {
        initial_capacity,
        index_capacity,
    });
    let mut model = Model::default();

    for op in input.operations {
        match op {
            Operation::Push(mut data) => {
                data.truncate(MAX_PUSH);
                slab.push(&data);
                let padding = align_up(data.len()) - data.len();
                model.records.push_back((data, padding));
            }

            Operation::Pop(len) => {
                let len = len as usize;
                let available = model.bytes().len();
                if len == 0 || len > available {
                    assert_eq!(slab.pop(len), 0);
                } else {
                    assert_eq!(slab.pop(len), len);
                    model.pop(len);
                }
            }

            Operation::PopItem => {
                let expected = model.records.pop_front().map(|(data, _)| data.len());
                assert_eq!(slab.pop_item(), expected);
            }

            Operation::Peek(len) => {
                let len = len as usize;
                let bytes = model.bytes();
                match slab.peek(len) {
                    Some(view) => assert_eq!(view, &bytes[..len]),
                    None => assert!(len == 0 || len > bytes.len()),
                }
            }

            Operation::PeekItem(n) => {
                let n = n as usize;
                match model.records.get(n) {
                    Some((data, _)) => assert_eq!(slab.peek_item(n).unwrap(), data.as_slice()),
                    None => assert!(slab.peek_item(n).is_none()),
                }
            }

            Operation::PeekSize => {
                assert_eq!(slab.peek_size(), model.bytes().len());
            }

            Operation::ItemCount => {
                assert_eq!(slab.item_count(), model.records.len());
            }

            Operation::Iterate => {
                let mut cursor = Cursor::default();
                let mut expected = model.records.iter();
                while let Some(item) = slab.peek_item_iter(&mut cursor) {
                    let (data, _) = expected.next().unwrap();
                    assert_eq!(item, data.as_slice());
                }
                assert!(expected.next().is_none());

                // Exhausted cursors stay exhausted
                let exhausted = cursor;
                assert!(slab.peek_item_iter(&mut cursor).is_none());
                assert_eq!(cursor, exhausted);
            }

            Operation::Clear => {
                slab.clear();
                model.records.clear();
            }
        }

        assert!(slab.peek_size() <= slab.capacity());
        assert_eq!(slab.is_empty(), model.records.is_empty());
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
