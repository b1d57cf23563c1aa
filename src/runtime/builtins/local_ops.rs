//! Words over the task's activation chain.

use crate::{
    error::{Result, VmError},
    runtime::{cell::CellType, vm::Vm},
};

/// ( x 'name -- )
pub(super) fn builtin_bind(vm: &mut Vm) -> Result<()> {
    let name = vm.pop_typed("bind", CellType::Symbol)?;
    let value = vm.pop()?;
    let act = vm.task()?.act;
    vm.acts
        .bind(act, name.value, value, &mut vm.cells, &mut vm.heap)
}

/// ( 'name -- x )
pub(super) fn builtin_lookup(vm: &mut Vm) -> Result<()> {
    let name = vm.pop_typed("lookup", CellType::Symbol)?;
    let act = vm.task()?.act;
    match vm.acts.lookup(act, name.value, &vm.cells) {
        Some(value) => {
            vm.retain(value);
            vm.push(value)
        }
        None => Err(VmError::UnknownWord(vm.symbol_text(name.value))),
    }
}

/// Opens a child scope of the current activation.
pub(super) fn builtin_enter(vm: &mut Vm) -> Result<()> {
    let outer = vm.task()?.act;
    let inner = vm.acts.create(outer);
    vm.task_mut()?.act = inner;
    // The child's parent link now keeps `outer` alive.
    vm.acts.deref(outer, &mut vm.cells, &mut vm.heap);
    Ok(())
}

/// Returns to the parent scope, releasing the current one if unshared.
pub(super) fn builtin_leave(vm: &mut Vm) -> Result<()> {
    let inner = vm.task()?.act;
    let outer = vm.acts.parent(inner).ok_or(VmError::ScopeUnderflow)?;
    vm.acts.add_ref(outer);
    vm.task_mut()?.act = outer;
    vm.acts.deref(inner, &mut vm.cells, &mut vm.heap);
    Ok(())
}
