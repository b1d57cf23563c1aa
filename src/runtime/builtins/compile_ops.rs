//! Immediate words, run by the compiler instead of being emitted.

use crate::{
    error::Result,
    runtime::{cell::Cell, vm::Vm},
    syntax::{compiler::Control, token::TokenKind},
};

/// `: name` opens a definition.
pub(super) fn builtin_colon(vm: &mut Vm) -> Result<()> {
    let compiler = vm.compiler_mut()?;
    let name = match compiler.next_token().map(|token| token.kind) {
        Some(TokenKind::Word(name)) => name,
        Some(other) => return Err(compiler.error(format!("`{}` cannot name a word", other))),
        None => return Err(compiler.error("`:` needs a name")),
    };
    let sym = vm.intern(&name)?;
    vm.compiler_mut()?.begin_definition(sym);
    Ok(())
}

/// `;` closes the definition and publishes it.
pub(super) fn builtin_semicolon(vm: &mut Vm) -> Result<()> {
    let buffer = vm.compiler_mut()?.end_definition()?;
    let name = buffer.name.unwrap_or_default();
    vm.define_word(name, buffer.cells)?;
    Ok(())
}

pub(super) fn builtin_if(vm: &mut Vm) -> Result<()> {
    let at = vm.emit_branch(true)?;
    vm.compiler_mut()?.push_control(Control::Forward(at));
    Ok(())
}

pub(super) fn builtin_else(vm: &mut Vm) -> Result<()> {
    let from_if = vm.compiler_mut()?.pop_forward("else")?;
    let at = vm.emit_branch(false)?;
    let compiler = vm.compiler_mut()?;
    let here = compiler.here();
    compiler.patch(from_if, Cell::int((here - from_if) as i32));
    compiler.push_control(Control::Forward(at));
    Ok(())
}

pub(super) fn builtin_then(vm: &mut Vm) -> Result<()> {
    let compiler = vm.compiler_mut()?;
    let at = compiler.pop_forward("then")?;
    let here = compiler.here();
    compiler.patch(at, Cell::int((here - at) as i32));
    Ok(())
}

pub(super) fn builtin_begin(vm: &mut Vm) -> Result<()> {
    let compiler = vm.compiler_mut()?;
    let here = compiler.here();
    compiler.push_control(Control::Backward(here));
    Ok(())
}

fn close_loop(vm: &mut Vm, word: &str, conditional: bool) -> Result<()> {
    let target = vm.compiler_mut()?.pop_backward(word)?;
    let at = vm.emit_branch(conditional)?;
    vm.compiler_mut()?
        .patch(at, Cell::int(target as i32 - at as i32));
    Ok(())
}

/// `begin ... flag until` loops while the flag is false.
pub(super) fn builtin_until(vm: &mut Vm) -> Result<()> {
    close_loop(vm, "until", true)
}

pub(super) fn builtin_again(vm: &mut Vm) -> Result<()> {
    close_loop(vm, "again", false)
}
