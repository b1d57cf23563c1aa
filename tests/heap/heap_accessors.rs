use std::{cell::Cell, rc::Rc};

use knot::runtime::heap::{ByteHeap, NULL};

fn heap_with_invalid_counter(capacity: usize) -> (ByteHeap, Rc<Cell<usize>>) {
    let invalid = Rc::new(Cell::new(0));
    let hook = invalid.clone();
    let heap = ByteHeap::with_hooks(
        capacity,
        Box::new(|_| {}),
        Box::new(move |_| hook.set(hook.get() + 1)),
    );
    (heap, invalid)
}

#[test]
fn typed_values_share_little_endian_storage() {
    let mut heap = ByteHeap::new(1024);
    let p = heap.malloc(32);

    heap.store_i32(p, -2);
    assert_eq!(heap.load_u32(p), 0xFFFF_FFFE);
    assert_eq!(heap.load_u8(p), 0xFE);

    heap.store_f32(p + 4, 1.5);
    assert_eq!(heap.load_u32(p + 4), 1.5f32.to_bits());

    heap.store_i64(p + 8, i64::MIN);
    assert_eq!(heap.load_i64(p + 8), i64::MIN);
    assert_eq!(heap.load_u8(p + 15), 0x80);

    heap.store_f64(p + 16, -0.25);
    assert_eq!(heap.load_f64(p + 16), -0.25);

    heap.store_u16(p + 24, 0xBEEF);
    assert_eq!(heap.bytes(p + 24, 2), Some(&[0xEF, 0xBE][..]));
}

#[test]
fn byte_slices_round_trip() {
    let mut heap = ByteHeap::new(1024);
    let p = heap.malloc(16);
    heap.write_bytes(p, b"knot heap");
    assert_eq!(heap.bytes(p, 9), Some(&b"knot heap"[..]));
}

#[test]
fn accesses_past_the_buffer_are_reported() {
    let (mut heap, invalid) = heap_with_invalid_counter(256);
    let end = heap.capacity() as u32;

    assert_eq!(heap.load_u32(end - 2), 0);
    heap.store_u64(end - 4, u64::MAX);
    assert!(heap.bytes(end, 1).is_none());
    heap.write_bytes(end - 1, &[1, 2]);
    assert_eq!(invalid.get(), 4);
    assert!(heap.check_integrity());
}

#[test]
fn realloc_moves_contents_to_a_larger_block() {
    let mut heap = ByteHeap::new(8192);
    let p = heap.malloc(16);
    heap.write_bytes(p, &[7; 16]);
    let q = heap.realloc(p, 3000);
    assert_ne!(q, NULL);
    assert_eq!(heap.bytes(q, 16), Some(&[7; 16][..]));
    assert!(heap.get_size(q) >= 3000);
    assert_eq!(heap.live_blocks(), 1);
}
