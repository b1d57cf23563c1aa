//! Property tests for the byte heap.
//!
//! Random sequences of allocations, locks, unlocks and writes are replayed
//! against a simple model; after every step the heap must still account
//! for its whole buffer and every live block must keep its contents.

use knot::runtime::heap::{Address, ByteHeap, NULL};
use proptest::prelude::*;

const CAPACITY: usize = 16 * 1024;

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Lock(usize),
    Unlock(usize),
    Fill(usize, u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1usize..3000).prop_map(Op::Alloc),
        1 => any::<usize>().prop_map(Op::Lock),
        3 => any::<usize>().prop_map(Op::Unlock),
        2 => (any::<usize>(), any::<u8>()).prop_map(|(i, b)| Op::Fill(i, b)),
    ]
}

#[derive(Debug)]
struct Live {
    address: Address,
    len: usize,
    refs: u32,
    fill: u8,
}

fn fill(heap: &mut ByteHeap, block: &Live) {
    heap.write_bytes(block.address, &vec![block.fill; block.len]);
}

fn check(heap: &ByteHeap, model: &[Live]) -> Result<(), TestCaseError> {
    let stats = heap.walk();
    prop_assert!(stats.is_ok(), "walk failed: {:?}", stats);
    let stats = stats.unwrap();
    prop_assert_eq!(stats.allocated + stats.free + stats.overhead, stats.capacity);
    prop_assert_eq!(heap.live_blocks(), model.len());
    prop_assert_eq!(stats.blocks - stats.free_blocks, model.len());
    for block in model {
        prop_assert_eq!(heap.get_reference_count(block.address), block.refs);
        prop_assert!(heap.get_size(block.address) >= block.len);
        let bytes = heap.bytes(block.address, block.len).unwrap_or_default();
        prop_assert!(bytes.iter().all(|&b| b == block.fill));
    }
    Ok(())
}

proptest! {
    /// The heap agrees with a reference model across arbitrary operation
    /// sequences, and live blocks never overlap.
    #[test]
    fn heap_matches_model(ops in prop::collection::vec(op(), 1..200)) {
        let mut heap = ByteHeap::new(CAPACITY);
        let mut model: Vec<Live> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc(len) => {
                    let address = heap.malloc(len);
                    if address != NULL {
                        let block = Live { address, len, refs: 1, fill: model.len() as u8 };
                        fill(&mut heap, &block);
                        model.push(block);
                    }
                }
                Op::Lock(i) if !model.is_empty() => {
                    let i = i % model.len();
                    heap.lock(model[i].address);
                    model[i].refs += 1;
                }
                Op::Unlock(i) if !model.is_empty() => {
                    let i = i % model.len();
                    heap.unlock(model[i].address);
                    model[i].refs -= 1;
                    if model[i].refs == 0 {
                        model.swap_remove(i);
                    }
                }
                Op::Fill(i, byte) if !model.is_empty() => {
                    let i = i % model.len();
                    model[i].fill = byte;
                    fill(&mut heap, &model[i]);
                }
                _ => {}
            }
            check(&heap, &model)?;
        }

        for block in model.drain(..) {
            for _ in 0..block.refs {
                heap.free(block.address);
            }
        }
        let stats = heap.walk().unwrap();
        prop_assert_eq!(stats.allocated, 0);
        prop_assert_eq!(heap.live_blocks(), 0);
    }

    /// Everything freed can be allocated again at the same size.
    #[test]
    fn freed_space_is_reusable(sizes in prop::collection::vec(1usize..1500, 1..40)) {
        let mut heap = ByteHeap::new(CAPACITY);
        let first: Vec<Address> = sizes.iter().map(|&size| heap.malloc(size)).collect();
        let placed = first.iter().filter(|&&p| p != NULL).count();
        for &p in first.iter().filter(|&&p| p != NULL) {
            heap.free(p);
        }
        let second = sizes
            .iter()
            .map(|&size| heap.malloc(size))
            .filter(|&p| p != NULL)
            .count();
        prop_assert!(second >= placed);
    }
}
