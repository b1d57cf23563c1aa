use crate::{
    error::{Result, VmError},
    runtime::{
        cell::{Cell, CellType},
        payload,
        vm::Vm,
    },
};

use super::helpers::type_error;

/// ( string|array -- n )
pub(super) fn builtin_length(vm: &mut Vm) -> Result<()> {
    let top = vm.pop()?;
    if !top.ty.is_heap_backed() {
        vm.release(top);
        return Err(type_error("length", "string or array", top));
    }
    let len = payload::payload_len(vm.heap(), top.value);
    vm.release(top);
    vm.push(Cell::int(len? as i32))
}

/// ( x1 .. xn n -- array ), x1 landing at index 0.
pub(super) fn builtin_array(vm: &mut Vm) -> Result<()> {
    let len = vm.pop_int("array")?;
    if len < 0 {
        return Err(VmError::IndexOutOfBounds {
            index: len as i64,
            len: 0,
        });
    }
    if vm.task()?.stacks.depth() < len as usize {
        return Err(VmError::StackUnderflow);
    }
    let addr = payload::alloc_array(vm.heap_mut(), len as usize)?;
    for index in (0..len as i64).rev() {
        let element = vm.pop()?;
        payload::array_set(vm.heap_mut(), addr, index, element)?;
    }
    vm.push(Cell::new(CellType::Array, 0, addr))
}

/// ( array i -- x )
pub(super) fn builtin_fetch(vm: &mut Vm) -> Result<()> {
    let index = vm.pop_int("@")?;
    let array = vm.pop_typed("@", CellType::Array)?;
    let element = payload::array_get(vm.heap(), array.value, index as i64);
    if let Ok(element) = element {
        vm.retain(element);
    }
    vm.release(array);
    vm.push(element?)
}

/// ( x array i -- )
pub(super) fn builtin_store(vm: &mut Vm) -> Result<()> {
    let index = vm.pop_int("!")?;
    let array = vm.pop_typed("!", CellType::Array)?;
    let value = vm.pop()?;
    let stored = payload::array_set(vm.heap_mut(), array.value, index as i64, value);
    if stored.is_err() {
        vm.release(value);
    }
    vm.release(array);
    stored
}

/// ( x -- 'type )
pub(super) fn builtin_type_of(vm: &mut Vm) -> Result<()> {
    let top = vm.pop()?;
    vm.release(top);
    let sym = vm.intern(top.ty.name())?;
    vm.push(Cell::symbol(sym))
}
