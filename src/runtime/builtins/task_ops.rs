use crate::{
    error::Result,
    runtime::{
        cell::{Cell, CellType},
        task::TaskState,
        vm::Vm,
    },
};

/// ( fn -- task ) Starts a child task at `fn`.
pub(super) fn builtin_spawn(vm: &mut Vm) -> Result<()> {
    let function = vm.pop_typed("spawn", CellType::Function)?;
    let parent = vm.current_id()?;
    let child = vm.spawn_task(function.value, Some(parent));
    vm.push(Cell::int(child.raw() as i32))
}

/// Gives up the processor; the task is requeued behind the ready tasks.
pub(super) fn builtin_yield(vm: &mut Vm) -> Result<()> {
    vm.task_mut()?.state = TaskState::Suspended;
    Ok(())
}

/// ( task -- ) Yields directly to `task` if it is ready.
pub(super) fn builtin_switch(vm: &mut Vm) -> Result<()> {
    let raw = vm.pop_int("switch")?;
    let target = vm.task_id_from(raw)?;
    if vm.task_state(target) == Some(TaskState::Ready) {
        vm.scheduler.enqueue_front(target);
    }
    vm.task_mut()?.state = TaskState::Suspended;
    Ok(())
}

/// ( -- task )
pub(super) fn builtin_self(vm: &mut Vm) -> Result<()> {
    let id = vm.current_id()?;
    vm.push(Cell::int(id.raw() as i32))
}

/// ( task -- )
pub(super) fn builtin_kill(vm: &mut Vm) -> Result<()> {
    let raw = vm.pop_int("kill")?;
    let target = vm.task_id_from(raw)?;
    vm.cancel_task(target)
}
