use crate::{
    error::{Result, VmError},
    runtime::{
        cell::{Cell, CellType},
        vm::Vm,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Num {
    Int(i32),
    Float(f32),
}

impl Num {
    pub(super) fn of(cell: Cell) -> Option<Self> {
        match cell.ty {
            CellType::Integer => Some(Num::Int(cell.as_int())),
            CellType::Float => Some(Num::Float(cell.as_float())),
            _ => None,
        }
    }

    pub(super) fn as_f32(self) -> f32 {
        match self {
            Num::Int(v) => v as f32,
            Num::Float(v) => v,
        }
    }
}

pub(super) fn type_error(op: &'static str, expected: &'static str, found: Cell) -> VmError {
    VmError::TypeMismatch {
        op,
        expected,
        found: found.ty.name(),
    }
}

/// Pops the two operands of a binary word, `a` below `b`.
pub(super) fn pop_pair(vm: &mut Vm) -> Result<(Cell, Cell)> {
    if vm.task()?.stacks.depth() < 2 {
        return Err(VmError::StackUnderflow);
    }
    let b = vm.pop()?;
    let a = vm.pop()?;
    Ok((a, b))
}

/// Converts both operands to numbers, releasing them on mismatch.
pub(super) fn numbers(vm: &mut Vm, op: &'static str, a: Cell, b: Cell) -> Result<(Num, Num)> {
    match (Num::of(a), Num::of(b)) {
        (Some(x), Some(y)) => Ok((x, y)),
        (x, _) => {
            let bad = if x.is_none() { a } else { b };
            vm.release(a);
            vm.release(b);
            Err(type_error(op, "number", bad))
        }
    }
}

pub(super) fn flag(value: bool) -> Cell {
    Cell::int(value as i32)
}
