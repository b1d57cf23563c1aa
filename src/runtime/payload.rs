//! Byte-heap encodings for string and array cell payloads.
//!
//! Both start with a u32 element count. Strings follow with UTF-8 bytes,
//! arrays with `(tag, value)` u32 pairs. A cell of a heap-backed type owns
//! exactly one reference on its block: copying the cell means `lock`,
//! dropping it means `unlock`.

use crate::{
    error::{Result, VmError},
    runtime::{
        cell::{Cell, CellType},
        heap::{Address, ByteHeap, NULL},
    },
};

const LEN_BYTES: usize = 4;
const ELEMENT_BYTES: usize = 8;

fn checked_alloc(heap: &mut ByteHeap, size: usize) -> Result<Address> {
    match heap.malloc(size) {
        NULL => Err(VmError::OutOfMemory { requested: size }),
        addr => Ok(addr),
    }
}

fn ensure_live(heap: &ByteHeap, addr: Address) -> Result<()> {
    if heap.get_reference_count(addr) == 0 {
        return Err(VmError::InvalidMemoryAccess { address: addr });
    }
    Ok(())
}

pub fn alloc_string(heap: &mut ByteHeap, text: &str) -> Result<Address> {
    let addr = checked_alloc(heap, LEN_BYTES + text.len())?;
    heap.store_u32(addr, text.len() as u32);
    heap.write_bytes(addr + LEN_BYTES as u32, text.as_bytes());
    Ok(addr)
}

pub fn read_string(heap: &ByteHeap, addr: Address) -> Result<String> {
    ensure_live(heap, addr)?;
    let len = heap.load_u32(addr) as usize;
    let bytes = heap
        .bytes(addr + LEN_BYTES as u32, len)
        .ok_or(VmError::InvalidMemoryAccess { address: addr })?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// Allocates an array of `len` void elements.
pub fn alloc_array(heap: &mut ByteHeap, len: usize) -> Result<Address> {
    let addr = checked_alloc(heap, LEN_BYTES + len * ELEMENT_BYTES)?;
    heap.store_u32(addr, len as u32);
    for index in 0..len {
        write_element(heap, addr, index, Cell::VOID);
    }
    Ok(addr)
}

pub fn payload_len(heap: &ByteHeap, addr: Address) -> Result<usize> {
    ensure_live(heap, addr)?;
    Ok(heap.load_u32(addr) as usize)
}

fn element_offset(addr: Address, index: usize) -> Address {
    addr + (LEN_BYTES + index * ELEMENT_BYTES) as Address
}

fn write_element(heap: &mut ByteHeap, addr: Address, index: usize, cell: Cell) {
    let at = element_offset(addr, index);
    heap.store_u32(at, cell.ty as u32);
    heap.store_u32(at + 4, cell.value);
}

fn bounds(heap: &ByteHeap, addr: Address, index: i64) -> Result<usize> {
    let len = payload_len(heap, addr)?;
    if index < 0 || index as usize >= len {
        return Err(VmError::IndexOutOfBounds { index, len });
    }
    Ok(index as usize)
}

/// Reads an element without touching reference counts.
pub fn array_get(heap: &ByteHeap, addr: Address, index: i64) -> Result<Cell> {
    let index = bounds(heap, addr, index)?;
    let at = element_offset(addr, index);
    let ty = CellType::from_tag(heap.load_u32(at)).unwrap_or(CellType::Void);
    Ok(Cell::new(ty, 0, heap.load_u32(at + 4)))
}

/// Stores `cell`, taking over its reference, and releases the old element.
pub fn array_set(heap: &mut ByteHeap, addr: Address, index: i64, cell: Cell) -> Result<()> {
    let old = array_get(heap, addr, index)?;
    write_element(heap, addr, index as usize, cell);
    release_value(heap, old);
    Ok(())
}

/// Takes one more reference on a heap-backed value.
pub fn retain_value(heap: &mut ByteHeap, cell: Cell) {
    if cell.ty.is_heap_backed() {
        heap.lock(cell.value);
    }
}

/// Drops one reference, releasing array elements with the last one.
pub fn release_value(heap: &mut ByteHeap, cell: Cell) {
    match cell.ty {
        CellType::String => heap.unlock(cell.value),
        CellType::Array => {
            if heap.is_last_reference(cell.value) {
                let len = heap.load_u32(cell.value) as usize;
                for index in 0..len {
                    let at = element_offset(cell.value, index);
                    let ty = CellType::from_tag(heap.load_u32(at)).unwrap_or(CellType::Void);
                    release_value(heap, Cell::new(ty, 0, heap.load_u32(at + 4)));
                }
            }
            heap.unlock(cell.value);
        }
        _ => {}
    }
}
