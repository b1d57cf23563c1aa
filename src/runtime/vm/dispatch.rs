use crate::{
    error::{Result, VmError},
    runtime::{
        builtin_function::BuiltinOp,
        cell::{Cell, CellIndex, CellType},
        dictionary::BuiltinId,
    },
};

use super::Vm;

/// What a name resolved to in the active dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolved {
    Builtin(BuiltinId),
    Word(CellIndex),
}

impl Vm {
    /// Fetches the cell at the current task's `ip`, advances `ip` and
    /// executes the cell.
    pub(crate) fn step(&mut self) -> Result<()> {
        let id = self.current_id()?;
        let task = self
            .scheduler
            .get_mut(id)
            .ok_or(VmError::UnknownTask(id.raw()))?;
        let ip = task.ip;
        let cell = match self.cells.get(ip) {
            Some(cell) if ip != 0 && cell.ty != CellType::Free => cell,
            _ => return Err(VmError::IpOutOfRange(ip)),
        };
        task.ip = ip + 1;
        if self.trace {
            self.trace_step(id, ip, cell);
        }
        self.dispatch(cell)
    }

    /// Executes one threaded-code cell.
    pub(crate) fn dispatch(&mut self, cell: Cell) -> Result<()> {
        match cell.ty {
            CellType::Builtin => self.invoke(cell.name),
            CellType::Code => self.call_address(cell.value),
            _ => self.push_literal(cell),
        }
    }

    /// Pushes a copy of a literal, taking a reference on heap payloads.
    fn push_literal(&mut self, cell: Cell) -> Result<()> {
        self.task_mut()?.stacks.push(cell)?;
        self.retain(cell);
        Ok(())
    }

    /// Saves the return address and jumps to `target`.
    pub(crate) fn call_address(&mut self, target: CellIndex) -> Result<()> {
        let task = self.task_mut()?;
        task.stacks.rpush(Cell::code(task.ip))?;
        task.ip = target;
        Ok(())
    }

    pub(crate) fn resolve(&self, sym: CellIndex) -> Result<Option<Resolved>> {
        let dictionary = self.task()?.active();
        Ok(dictionary
            .builtin(sym)
            .map(Resolved::Builtin)
            .or_else(|| dictionary.word(sym).map(Resolved::Word)))
    }

    fn run_resolved(&mut self, target: Resolved) -> Result<()> {
        match target {
            Resolved::Builtin(id) => self.call_builtin(id),
            Resolved::Word(address) => self.call_address(address),
        }
    }

    /// Resolves a builtin cell by name: native operation first, then a
    /// compiled word, then the `method-missing` handler with the name
    /// pushed for it.
    pub(crate) fn invoke(&mut self, sym: CellIndex) -> Result<()> {
        if let Some(target) = self.resolve(sym)? {
            return self.run_resolved(target);
        }
        match self.resolve(self.symbols.method_missing)? {
            Some(handler) => {
                self.push(Cell::symbol(sym))?;
                self.run_resolved(handler)
            }
            None => Err(VmError::UnknownBuiltin(self.symbol_text(sym))),
        }
    }

    pub(crate) fn call_builtin(&mut self, id: BuiltinId) -> Result<()> {
        let op = self
            .builtin_entry(id)
            .map(|entry| entry.op.clone())
            .ok_or_else(|| VmError::UnknownBuiltin(format!("#{}", id)))?;
        match op {
            BuiltinOp::Native(func) => func(self),
            BuiltinOp::Foreign(func) => func(self),
        }
    }
}
