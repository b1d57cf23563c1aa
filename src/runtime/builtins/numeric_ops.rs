use crate::{
    error::{Result, VmError},
    runtime::{
        cell::{Cell, CellType},
        payload,
        vm::Vm,
    },
};

use super::helpers::{Num, flag, numbers, pop_pair, type_error};

fn arithmetic(
    vm: &mut Vm,
    op: &'static str,
    int: fn(i32, i32) -> Result<i32>,
    float: fn(f32, f32) -> f32,
) -> Result<()> {
    let (a, b) = pop_pair(vm)?;
    let result = match numbers(vm, op, a, b)? {
        (Num::Int(x), Num::Int(y)) => Cell::int(int(x, y)?),
        (x, y) => Cell::float(float(x.as_f32(), y.as_f32())),
    };
    vm.push(result)
}

/// Numeric addition, or concatenation when both operands are strings.
pub(super) fn builtin_add(vm: &mut Vm) -> Result<()> {
    let a = vm.peek(1)?;
    let b = vm.peek(0)?;
    if a.ty == CellType::String && b.ty == CellType::String {
        let joined = vm.string_of(a)? + &vm.string_of(b)?;
        let result = vm.new_string(&joined)?;
        let (a, b) = pop_pair(vm)?;
        vm.release(a);
        vm.release(b);
        return vm.push(result);
    }
    arithmetic(vm, "+", |x, y| Ok(x.wrapping_add(y)), |x, y| x + y)
}

pub(super) fn builtin_sub(vm: &mut Vm) -> Result<()> {
    arithmetic(vm, "-", |x, y| Ok(x.wrapping_sub(y)), |x, y| x - y)
}

pub(super) fn builtin_mul(vm: &mut Vm) -> Result<()> {
    arithmetic(vm, "*", |x, y| Ok(x.wrapping_mul(y)), |x, y| x * y)
}

pub(super) fn builtin_div(vm: &mut Vm) -> Result<()> {
    arithmetic(
        vm,
        "/",
        |x, y| match y {
            0 => Err(VmError::DivisionByZero),
            _ => Ok(x.wrapping_div(y)),
        },
        |x, y| x / y,
    )
}

pub(super) fn builtin_mod(vm: &mut Vm) -> Result<()> {
    arithmetic(
        vm,
        "mod",
        |x, y| match y {
            0 => Err(VmError::DivisionByZero),
            _ => Ok(x.wrapping_rem(y)),
        },
        |x, y| x % y,
    )
}

pub(super) fn builtin_negate(vm: &mut Vm) -> Result<()> {
    let top = vm.pop()?;
    let result = match Num::of(top) {
        Some(Num::Int(v)) => Cell::int(v.wrapping_neg()),
        Some(Num::Float(v)) => Cell::float(-v),
        None => {
            vm.release(top);
            return Err(type_error("negate", "number", top));
        }
    };
    vm.push(result)
}

/// Equality by value: numbers compare numerically, strings by content,
/// anything else by tag and payload.
pub(super) fn builtin_eq(vm: &mut Vm) -> Result<()> {
    let (a, b) = pop_pair(vm)?;
    let equal = match (Num::of(a), Num::of(b)) {
        (Some(Num::Int(x)), Some(Num::Int(y))) => Ok(x == y),
        (Some(x), Some(y)) => Ok(x.as_f32() == y.as_f32()),
        _ if a.ty == CellType::String && b.ty == CellType::String => same_text(vm, a, b),
        _ => Ok(a.ty == b.ty && a.value == b.value),
    };
    vm.release(a);
    vm.release(b);
    vm.push(flag(equal?))
}

fn same_text(vm: &Vm, a: Cell, b: Cell) -> Result<bool> {
    if a.value == b.value {
        return Ok(true);
    }
    Ok(payload::read_string(vm.heap(), a.value)? == payload::read_string(vm.heap(), b.value)?)
}

fn compare(
    vm: &mut Vm,
    op: &'static str,
    int: fn(i32, i32) -> bool,
    float: fn(f32, f32) -> bool,
) -> Result<()> {
    let (a, b) = pop_pair(vm)?;
    let result = match numbers(vm, op, a, b)? {
        (Num::Int(x), Num::Int(y)) => int(x, y),
        (x, y) => float(x.as_f32(), y.as_f32()),
    };
    vm.push(flag(result))
}

pub(super) fn builtin_lt(vm: &mut Vm) -> Result<()> {
    compare(vm, "<", |x, y| x < y, |x, y| x < y)
}

pub(super) fn builtin_gt(vm: &mut Vm) -> Result<()> {
    compare(vm, ">", |x, y| x > y, |x, y| x > y)
}

pub(super) fn builtin_not(vm: &mut Vm) -> Result<()> {
    let top = vm.pop()?;
    vm.release(top);
    vm.push(flag(!top.is_truthy()))
}
