use super::{Cell, CellStore, CellType};
use crate::error::VmError;

#[test]
fn sentinel_occupies_index_zero() {
    let store = CellStore::new(16);
    assert_eq!(store.get(0), Some(Cell::VOID));
    assert_eq!(store.live_count(), 0);
}

#[test]
fn intern_is_idempotent() {
    let mut store = CellStore::new(16);
    let foo = store.intern("foo").unwrap();
    assert_eq!(store.intern("foo").unwrap(), foo);
    assert_ne!(store.intern("bar").unwrap(), foo);
    assert_ne!(foo, 0);
    assert_eq!(store.symbol_name(foo), Some("foo"));
    assert_eq!(store.get(foo).unwrap().ty, CellType::Symbol);
}

#[test]
fn alloc_never_returns_sentinel() {
    let mut store = CellStore::new(16);
    let first = store.alloc(CellType::Integer, 0, 7).unwrap();
    assert_eq!(first, 1);
}

#[test]
fn released_cells_are_reused_first() {
    let mut store = CellStore::new(16);
    let a = store.alloc(CellType::Integer, 0, 1).unwrap();
    let b = store.alloc(CellType::Integer, 0, 2).unwrap();
    store.release(a);
    store.release(b);
    assert_eq!(store.free_count(), 2);

    // LIFO: the most recently released cell comes back first.
    assert_eq!(store.alloc(CellType::Float, 0, 0).unwrap(), b);
    let reused = store.alloc(CellType::String, 5, 9).unwrap();
    assert_eq!(reused, a);
    assert_eq!(store.get(a), Some(Cell::new(CellType::String, 5, 9)));
    assert_eq!(store.top(), 3);
}

#[test]
fn free_cells_link_through_name() {
    let mut store = CellStore::new(16);
    let a = store.alloc(CellType::Integer, 0, 1).unwrap();
    let b = store.alloc(CellType::Integer, 0, 2).unwrap();
    store.release(a);
    store.release(b);
    let head = store.get(b).unwrap();
    assert_eq!(head.ty, CellType::Free);
    assert_eq!(head.name, a);
}

#[test]
fn symbols_survive_release() {
    let mut store = CellStore::new(16);
    let sym = store.intern("keep").unwrap();
    store.release(sym);
    assert_eq!(store.get(sym).unwrap().ty, CellType::Symbol);
    assert_eq!(store.free_count(), 0);
}

#[test]
fn set_value_preserves_name() {
    let mut store = CellStore::new(16);
    let cell = store.alloc(CellType::Integer, 42, 1).unwrap();
    store.set_value(cell, CellType::Float, 2.5f32.to_bits());
    let read = store.get(cell).unwrap();
    assert_eq!(read.name, 42);
    assert_eq!(read.as_float(), 2.5);

    store.set_content(cell, CellType::Integer, 0, 3);
    assert_eq!(store.get(cell), Some(Cell::int(3)));
}

#[test]
fn append_is_contiguous_even_with_free_cells() {
    let mut store = CellStore::new(16);
    let a = store.alloc(CellType::Integer, 0, 1).unwrap();
    store.release(a);
    let start = store.append(&[Cell::int(1), Cell::int(2)]).unwrap();
    assert_eq!(start, 2);
    assert_eq!(store.get(start + 1), Some(Cell::int(2)));
    assert_eq!(store.free_count(), 1);
}

#[test]
fn limit_is_enforced() {
    let mut store = CellStore::new(3);
    store.alloc(CellType::Integer, 0, 1).unwrap();
    store.alloc(CellType::Integer, 0, 2).unwrap();
    assert_eq!(store.alloc(CellType::Integer, 0, 3), Err(VmError::OutOfCells));
}
