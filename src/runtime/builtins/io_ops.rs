use crate::{error::Result, runtime::vm::Vm};

/// ( x -- ) Writes `x` and a newline to the output buffer.
pub(super) fn builtin_print(vm: &mut Vm) -> Result<()> {
    let top = vm.pop()?;
    let text = vm.display_cell(top);
    vm.release(top);
    let text = text?;
    vm.write_output(&text);
    vm.write_output("\n");
    Ok(())
}

/// ( code -- ) Writes one character.
pub(super) fn builtin_emit(vm: &mut Vm) -> Result<()> {
    let code = vm.pop_int("emit")?;
    let c = char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
    vm.write_output(c.encode_utf8(&mut [0; 4]));
    Ok(())
}

pub(super) fn builtin_cr(vm: &mut Vm) -> Result<()> {
    vm.write_output("\n");
    Ok(())
}

/// Walks the byte heap, failing with the first corrupt block.
pub(super) fn builtin_heap_check(vm: &mut Vm) -> Result<()> {
    vm.heap().walk().map(|_| ())
}
