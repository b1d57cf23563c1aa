//! Entry points for embedding the VM.

use std::rc::Rc;

use sha2::{Digest, Sha256};

use crate::{
    error::{Result, VmError},
    runtime::{
        builtin_function::BuiltinOp,
        cell::{Cell, CellIndex, CellType},
        host_value::HostValue,
        leak_detector::{self, LeakStats},
        payload,
        task::{Mode, TaskId},
    },
};

use super::Vm;

/// Compiled entry point of a script, keyed by the script id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedScript {
    pub digest: [u8; 32],
    pub entry: CellIndex,
}

impl Vm {
    /// Compiles and runs `source` to completion and returns the final
    /// operand stack of its task, bottom first.
    ///
    /// Scripts are cached by `script_id`; the cached code is reused while
    /// the source digest is unchanged. Tasks spawned by the script run in
    /// the same call.
    pub fn execute(&mut self, source: &str, script_id: &str) -> Result<Vec<HostValue>> {
        let digest: [u8; 32] = Sha256::digest(source.as_bytes()).into();
        let task = self.create_held_task(0);
        let cached = self
            .scripts
            .get(script_id)
            .filter(|script| script.digest == digest)
            .map(|script| script.entry);
        let entry = match cached {
            Some(entry) => {
                tracing::debug!(script = script_id, entry, "script cache hit");
                entry
            }
            None => match self.compile(task, source) {
                Ok(entry) => {
                    self.scripts
                        .insert(script_id.to_string(), CachedScript { digest, entry });
                    entry
                }
                Err(err) => {
                    self.reclaim_task(task);
                    return Err(err);
                }
            },
        };
        self.run_held(task, entry)
    }

    /// Calls a builtin or compiled word with `args` pushed in order and
    /// returns what it leaves on the stack.
    pub fn call_verb(&mut self, name: &str, args: &[HostValue]) -> Result<Vec<HostValue>> {
        let sym = match self.cells.lookup_symbol(name) {
            Some(sym) if self.is_callable(sym) => sym,
            None if self.has_method_missing() => self.cells.intern(name)?,
            _ => return Err(VmError::UnknownWord(name.to_string())),
        };
        let entry = match self.trampolines.get(&sym) {
            Some(&entry) => entry,
            None => {
                let entry = self
                    .cells
                    .append(&[Cell::builtin(sym), Cell::builtin(self.symbols.next)])?;
                self.trampolines.insert(sym, entry);
                entry
            }
        };
        let task = self.create_held_task(entry);
        for arg in args {
            let pushed = self
                .from_host(arg)
                .and_then(|cell| self.push_to(task, cell));
            if let Err(err) = pushed {
                self.reclaim_task(task);
                return Err(err);
            }
        }
        self.run_held(task, entry)
    }

    fn is_callable(&self, sym: CellIndex) -> bool {
        let run = &self.defaults.run;
        run.builtin(sym).is_some() || run.word(sym).is_some() || self.has_method_missing()
    }

    fn has_method_missing(&self) -> bool {
        let run = &self.defaults.run;
        let handler = self.symbols.method_missing;
        run.builtin(handler).is_some() || run.word(handler).is_some()
    }

    fn push_to(&mut self, task: TaskId, cell: Cell) -> Result<()> {
        let pushed = match self.scheduler.get_mut(task) {
            Some(task) => task.stacks.push(cell),
            None => Err(VmError::UnknownTask(task.raw())),
        };
        if pushed.is_err() {
            self.release(cell);
        }
        pushed
    }

    fn run_held(&mut self, task: TaskId, entry: CellIndex) -> Result<Vec<HostValue>> {
        if let Some(held) = self.scheduler.get_mut(task) {
            held.ip = entry;
        }
        self.scheduler.enqueue(task);
        let previous = self.scheduler.current();
        let outcome = self.run();
        self.scheduler.set_current(previous);
        let result = self.collect_stack(task);
        self.reclaim_task(task);
        outcome?;
        result
    }

    fn collect_stack(&mut self, task: TaskId) -> Result<Vec<HostValue>> {
        let held = self
            .scheduler
            .get_mut(task)
            .ok_or(VmError::UnknownTask(task.raw()))?;
        if let Some(fault) = held.fault.take() {
            return Err(fault);
        }
        let cells = held.stacks.operands().to_vec();
        cells.into_iter().map(|cell| self.to_host(cell)).collect()
    }

    /// Makes `f` callable by `name` from scripts and through
    /// [`Vm::call_verb`]. Foreign verbs shadow compiled words of the same
    /// name.
    pub fn register_foreign_verb<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Vm) -> Result<()> + 'static,
    {
        let id = self.install_builtin(name, BuiltinOp::Foreign(Rc::new(f)), Mode::Run)?;
        let sym = self.cells.intern(name)?;
        let live: Vec<TaskId> = self.scheduler.ids().collect();
        for task in live {
            if let Some(task) = self.scheduler.get_mut(task) {
                task.dictionaries.run.define_builtin(sym, id);
            }
        }
        tracing::debug!(verb = name, id, "register foreign verb");
        Ok(())
    }

    /// Reads a global binding from the root activation.
    pub fn get_value(&self, name: &str) -> Result<Option<HostValue>> {
        let Some(sym) = self.cells.lookup_symbol(name) else {
            return Ok(None);
        };
        match self.acts.lookup(self.acts.root(), sym, &self.cells) {
            Some(cell) => self.to_host(cell).map(Some),
            None => Ok(None),
        }
    }

    /// Binds a global in the root activation, visible to every task.
    pub fn set_value(&mut self, name: &str, value: &HostValue) -> Result<()> {
        let sym = self.cells.intern(name)?;
        let cell = self.from_host(value)?;
        let root = self.acts.root();
        self.acts
            .bind(root, sym, cell, &mut self.cells, &mut self.heap)
    }

    /// Copies a cell out; reference counts are untouched.
    pub fn to_host(&self, cell: Cell) -> Result<HostValue> {
        Ok(match cell.ty {
            CellType::Integer => HostValue::Int(cell.as_int()),
            CellType::Float => HostValue::Float(cell.as_float()),
            CellType::String => HostValue::Str(self.string_of(cell)?),
            CellType::Symbol => HostValue::Symbol(self.symbol_text(cell.value)),
            CellType::Array => {
                let len = payload::payload_len(&self.heap, cell.value)?;
                let mut items = Vec::with_capacity(len);
                for index in 0..len {
                    let element = payload::array_get(&self.heap, cell.value, index as i64)?;
                    items.push(self.to_host(element)?);
                }
                HostValue::Array(items)
            }
            CellType::Function => HostValue::Function(cell.value),
            CellType::Object => HostValue::Object(cell.value),
            _ => HostValue::Void,
        })
    }

    /// Builds an owning cell for `value`, allocating heap payloads.
    pub fn from_host(&mut self, value: &HostValue) -> Result<Cell> {
        Ok(match value {
            HostValue::Void => Cell::VOID,
            HostValue::Int(v) => Cell::int(*v),
            HostValue::Float(v) => Cell::float(*v),
            HostValue::Str(text) => self.new_string(text)?,
            HostValue::Symbol(name) => Cell::symbol(self.cells.intern(name)?),
            HostValue::Array(items) => {
                let addr = payload::alloc_array(&mut self.heap, items.len())?;
                let array = Cell::new(CellType::Array, 0, addr);
                for (index, item) in items.iter().enumerate() {
                    let stored = self.from_host(item).and_then(|element| {
                        payload::array_set(&mut self.heap, addr, index as i64, element)
                    });
                    if let Err(err) = stored {
                        self.release(array);
                        return Err(err);
                    }
                }
                array
            }
            HostValue::Function(addr) => Cell::function(*addr),
            HostValue::Object(handle) => Cell::new(CellType::Object, 0, *handle),
        })
    }

    /// Pops the top of the running task's stack as a host value.
    pub fn pop_value(&mut self) -> Result<HostValue> {
        let cell = self.pop()?;
        let value = self.to_host(cell);
        self.release(cell);
        value
    }

    /// Pushes a host value onto the running task's stack.
    pub fn push_value(&mut self, value: &HostValue) -> Result<()> {
        let cell = self.from_host(value)?;
        self.push(cell)
    }

    pub fn leak_report(&self) -> LeakStats {
        leak_detector::snapshot(self)
    }

    pub fn cached_script(&self, script_id: &str) -> Option<&CachedScript> {
        self.scripts.get(script_id)
    }
}
