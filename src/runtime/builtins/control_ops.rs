use crate::{
    error::Result,
    runtime::{
        cell::{Cell, CellType},
        task::TaskState,
        vm::Vm,
    },
};

/// Returns to the caller, or terminates the task from its outermost frame.
pub(super) fn builtin_next(vm: &mut Vm) -> Result<()> {
    let task = vm.task_mut()?;
    match task.stacks.rpop() {
        Some(frame) => task.ip = frame.value,
        None => task.state = TaskState::Terminated,
    }
    Ok(())
}

/// Jumps by the offset stored in the following cell, relative to that cell.
pub(super) fn builtin_branch(vm: &mut Vm) -> Result<()> {
    let at = vm.task()?.ip;
    let offset = vm.cells().get(at).map_or(1, Cell::as_int);
    vm.task_mut()?.ip = at.wrapping_add_signed(offset);
    Ok(())
}

/// ( flag -- ) Branches when the flag is false, skips the offset otherwise.
pub(super) fn builtin_branch_if_false(vm: &mut Vm) -> Result<()> {
    let condition = vm.pop()?;
    vm.release(condition);
    if condition.is_truthy() {
        vm.task_mut()?.ip += 1;
        Ok(())
    } else {
        builtin_branch(vm)
    }
}

/// ( fn -- )
pub(super) fn builtin_call(vm: &mut Vm) -> Result<()> {
    let function = vm.pop_typed("call", CellType::Function)?;
    vm.call_address(function.value)
}
