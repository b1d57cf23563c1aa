//! Operand and return stack shuffling. Copies take a heap reference,
//! drops release one; moves leave counts alone.

use crate::{
    error::{Result, VmError},
    runtime::{cell::Cell, vm::Vm},
};

use super::helpers::pop_pair;

pub(super) fn builtin_dup(vm: &mut Vm) -> Result<()> {
    let top = vm.peek(0)?;
    vm.retain(top);
    vm.push(top)
}

pub(super) fn builtin_drop(vm: &mut Vm) -> Result<()> {
    let top = vm.pop()?;
    vm.release(top);
    Ok(())
}

pub(super) fn builtin_swap(vm: &mut Vm) -> Result<()> {
    let (a, b) = pop_pair(vm)?;
    vm.push(b)?;
    vm.push(a)
}

pub(super) fn builtin_over(vm: &mut Vm) -> Result<()> {
    let second = vm.peek(1)?;
    vm.retain(second);
    vm.push(second)
}

/// ( a b c -- b c a )
pub(super) fn builtin_rot(vm: &mut Vm) -> Result<()> {
    if vm.task()?.stacks.depth() < 3 {
        return Err(VmError::StackUnderflow);
    }
    let c = vm.pop()?;
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(b)?;
    vm.push(c)?;
    vm.push(a)
}

pub(super) fn builtin_nip(vm: &mut Vm) -> Result<()> {
    let (a, b) = pop_pair(vm)?;
    vm.release(a);
    vm.push(b)
}

pub(super) fn builtin_depth(vm: &mut Vm) -> Result<()> {
    let depth = vm.task()?.stacks.depth();
    vm.push(Cell::int(depth as i32))
}

pub(super) fn builtin_to_r(vm: &mut Vm) -> Result<()> {
    let top = vm.pop()?;
    let moved = vm.task_mut()?.stacks.rpush(top);
    if moved.is_err() {
        vm.release(top);
    }
    moved
}

pub(super) fn builtin_r_from(vm: &mut Vm) -> Result<()> {
    let top = vm
        .task_mut()?
        .stacks
        .rpop()
        .ok_or(VmError::StackUnderflow)?;
    vm.push(top)
}
