use std::{fmt, rc::Rc};

use crate::{error::Result, runtime::vm::Vm};

/// Native operation compiled into the VM.
pub type NativeFn = fn(&mut Vm) -> Result<()>;

/// Operation supplied by the host at run time.
pub type ForeignFn = Rc<dyn Fn(&mut Vm) -> Result<()>>;

/// Static table entry for a native operation.
#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFunction({})", self.name)
    }
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone)]
pub enum BuiltinOp {
    Native(NativeFn),
    Foreign(ForeignFn),
}

/// Slot in the VM's builtin table; dictionaries refer to it by index.
#[derive(Clone)]
pub struct BuiltinEntry {
    pub name: Rc<str>,
    pub op: BuiltinOp,
}

impl fmt::Debug for BuiltinEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.op {
            BuiltinOp::Native(_) => "native",
            BuiltinOp::Foreign(_) => "foreign",
        };
        write!(f, "BuiltinEntry({}, {})", self.name, kind)
    }
}
