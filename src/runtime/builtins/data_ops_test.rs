use crate::{
    config::VmConfig,
    error::VmError,
    runtime::{
        cell::{Cell, CellType},
        payload,
        vm::Vm,
    },
};

use super::data_ops::{builtin_array, builtin_fetch, builtin_length, builtin_store, builtin_type_of};

fn test_vm() -> Vm {
    let mut vm = Vm::new(VmConfig::default()).unwrap();
    let task = vm.spawn_held_task(0);
    vm.scheduler.set_current(Some(task));
    vm
}

#[test]
fn array_collects_items_in_stack_order() {
    let mut vm = test_vm();
    for value in [10, 20, 30, 3] {
        vm.push(Cell::int(value)).unwrap();
    }
    builtin_array(&mut vm).unwrap();
    let array = vm.pop().unwrap();
    assert_eq!(array.ty, CellType::Array);
    assert_eq!(payload::array_get(vm.heap(), array.value, 0).unwrap(), Cell::int(10));
    assert_eq!(payload::array_get(vm.heap(), array.value, 2).unwrap(), Cell::int(30));
    assert_eq!(vm.task().unwrap().stacks.depth(), 0);
}

#[test]
fn array_needs_enough_items() {
    let mut vm = test_vm();
    vm.push(Cell::int(1)).unwrap();
    vm.push(Cell::int(2)).unwrap();
    assert_eq!(builtin_array(&mut vm), Err(VmError::StackUnderflow));
}

#[test]
fn fetch_keeps_element_alive_after_array_is_dropped() {
    let mut vm = test_vm();
    let text = vm.new_string("hi").unwrap();
    vm.push(text).unwrap();
    vm.push(Cell::int(1)).unwrap();
    builtin_array(&mut vm).unwrap();
    vm.push(Cell::int(0)).unwrap();
    builtin_fetch(&mut vm).unwrap();

    let element = vm.pop().unwrap();
    assert_eq!(vm.string_of(element).unwrap(), "hi");
    assert_eq!(vm.heap().live_blocks(), 1);
    vm.release(element);
    assert_eq!(vm.heap().live_blocks(), 0);
}

#[test]
fn store_replaces_element() {
    let mut vm = test_vm();
    vm.push(Cell::int(1)).unwrap();
    vm.push(Cell::int(1)).unwrap();
    builtin_array(&mut vm).unwrap();
    let array = vm.pop().unwrap();
    vm.retain(array);

    vm.push(Cell::int(99)).unwrap();
    vm.push(array).unwrap();
    vm.push(Cell::int(0)).unwrap();
    builtin_store(&mut vm).unwrap();

    assert_eq!(payload::array_get(vm.heap(), array.value, 0).unwrap(), Cell::int(99));
    vm.release(array);
    assert_eq!(vm.heap().live_blocks(), 0);
}

#[test]
fn fetch_out_of_bounds_releases_array() {
    let mut vm = test_vm();
    vm.push(Cell::int(7)).unwrap();
    vm.push(Cell::int(1)).unwrap();
    builtin_array(&mut vm).unwrap();
    vm.push(Cell::int(5)).unwrap();
    assert_eq!(
        builtin_fetch(&mut vm),
        Err(VmError::IndexOutOfBounds { index: 5, len: 1 })
    );
    assert_eq!(vm.heap().live_blocks(), 0);
}

#[test]
fn length_and_type_of() {
    let mut vm = test_vm();
    let text = vm.new_string("hello").unwrap();
    vm.push(text).unwrap();
    builtin_length(&mut vm).unwrap();
    assert_eq!(vm.pop().unwrap(), Cell::int(5));

    vm.push(Cell::float(1.5)).unwrap();
    builtin_type_of(&mut vm).unwrap();
    let sym = vm.pop().unwrap();
    assert_eq!(vm.cells().symbol_name(sym.value), Some("float"));
}
