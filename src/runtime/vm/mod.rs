use std::{collections::HashMap, rc::Rc};

use crate::{
    config::VmConfig,
    error::{Result, VmError},
    runtime::{
        activation::ActivationPool,
        builtin_function::{BuiltinEntry, BuiltinOp},
        builtins::{COMPILE_BUILTINS, RUN_BUILTINS},
        cell::{Cell, CellIndex, CellStore, CellType},
        dictionary::{BuiltinId, Dictionaries},
        heap::ByteHeap,
        payload,
        scheduler::Scheduler,
        task::{Mode, Task, TaskId},
    },
    syntax::compiler::CompileState,
};

mod compile;
mod dispatch;
mod host_api;
mod tasks;
mod trace;

pub use host_api::CachedScript;

/// Symbols the dispatcher and compiler refer to directly.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CoreSymbols {
    pub next: CellIndex,
    pub branch: CellIndex,
    pub branch_if_false: CellIndex,
    pub method_missing: CellIndex,
}

/// The whole interpreter state, passed explicitly to every operation.
pub struct Vm {
    pub(crate) heap: ByteHeap,
    pub(crate) cells: CellStore,
    pub(crate) acts: ActivationPool,
    pub(crate) scheduler: Scheduler,
    builtins: Vec<BuiltinEntry>,
    defaults: Dictionaries,
    pub(crate) symbols: CoreSymbols,
    compiler: Option<CompileState>,
    scripts: HashMap<String, CachedScript>,
    trampolines: HashMap<CellIndex, CellIndex>,
    output: String,
    config: VmConfig,
    trace: bool,
}

impl Vm {
    pub fn new(config: VmConfig) -> Result<Self> {
        let mut heap = ByteHeap::new(config.heap_bytes);
        if config.self_test && !heap.verify() {
            return Err(VmError::CorruptionDetected { address: 0 });
        }
        let mut cells = CellStore::new(config.max_cells);
        let symbols = CoreSymbols {
            next: cells.intern("next")?,
            branch: cells.intern("branch")?,
            branch_if_false: cells.intern("?branch")?,
            method_missing: cells.intern("method-missing")?,
        };

        let mut vm = Self {
            heap,
            cells,
            acts: ActivationPool::new(),
            scheduler: Scheduler::default(),
            builtins: Vec::with_capacity(RUN_BUILTINS.len() + COMPILE_BUILTINS.len()),
            defaults: Dictionaries::default(),
            symbols,
            compiler: None,
            scripts: HashMap::new(),
            trampolines: HashMap::new(),
            output: String::new(),
            trace: config.trace,
            config,
        };
        for builtin in RUN_BUILTINS {
            vm.install_builtin(builtin.name, BuiltinOp::Native(builtin.func), Mode::Run)?;
        }
        for builtin in COMPILE_BUILTINS {
            vm.install_builtin(builtin.name, BuiltinOp::Native(builtin.func), Mode::Compile)?;
        }
        Ok(vm)
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn heap(&self) -> &ByteHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ByteHeap {
        &mut self.heap
    }

    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut CellStore {
        &mut self.cells
    }

    pub fn acts(&self) -> &ActivationPool {
        &self.acts
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Dictionaries new top-level tasks start from.
    pub fn defaults(&self) -> &Dictionaries {
        &self.defaults
    }

    /// Adds an operation to the builtin table and names it in the default
    /// dictionary for `mode`, replacing any previous binding of the name.
    pub(crate) fn install_builtin(
        &mut self,
        name: &str,
        op: BuiltinOp,
        mode: Mode,
    ) -> Result<BuiltinId> {
        let sym = self.cells.intern(name)?;
        let id = self.builtins.len() as BuiltinId;
        self.builtins.push(BuiltinEntry {
            name: Rc::from(name),
            op,
        });
        match mode {
            Mode::Run => self.defaults.run.define_builtin(sym, id),
            Mode::Compile => self.defaults.compile.define_builtin(sym, id),
        }
        Ok(id)
    }

    pub(crate) fn builtin_entry(&self, id: BuiltinId) -> Option<&BuiltinEntry> {
        self.builtins.get(id as usize)
    }

    pub fn builtin_count(&self) -> usize {
        self.builtins.len()
    }

    pub(crate) fn current_id(&self) -> Result<TaskId> {
        self.scheduler.current().ok_or(VmError::NoCurrentTask)
    }

    pub(crate) fn task(&self) -> Result<&Task> {
        let id = self.current_id()?;
        self.scheduler.get(id).ok_or(VmError::UnknownTask(id.raw()))
    }

    pub(crate) fn task_mut(&mut self) -> Result<&mut Task> {
        let id = self.current_id()?;
        self.scheduler
            .get_mut(id)
            .ok_or(VmError::UnknownTask(id.raw()))
    }

    /// Pushes an owned cell. On overflow the cell's reference is dropped.
    pub fn push(&mut self, cell: Cell) -> Result<()> {
        let pushed = self.task_mut().and_then(|task| task.stacks.push(cell));
        if pushed.is_err() {
            self.release(cell);
        }
        pushed
    }

    /// Pops a cell; the caller takes over its reference.
    pub fn pop(&mut self) -> Result<Cell> {
        self.task_mut()?.stacks.pop()
    }

    pub fn peek(&self, depth: usize) -> Result<Cell> {
        self.task()?.stacks.peek(depth)
    }

    pub(crate) fn retain(&mut self, cell: Cell) {
        payload::retain_value(&mut self.heap, cell);
    }

    pub(crate) fn release(&mut self, cell: Cell) {
        payload::release_value(&mut self.heap, cell);
    }

    pub(crate) fn pop_int(&mut self, op: &'static str) -> Result<i32> {
        let cell = self.pop()?;
        self.expect_type(op, cell, CellType::Integer)?;
        Ok(cell.as_int())
    }

    /// Pops a cell of type `ty`, releasing it and failing otherwise.
    pub(crate) fn pop_typed(&mut self, op: &'static str, ty: CellType) -> Result<Cell> {
        let cell = self.pop()?;
        self.expect_type(op, cell, ty)?;
        Ok(cell)
    }

    fn expect_type(&mut self, op: &'static str, cell: Cell, ty: CellType) -> Result<()> {
        if cell.ty == ty {
            return Ok(());
        }
        self.release(cell);
        Err(VmError::TypeMismatch {
            op,
            expected: ty.name(),
            found: cell.ty.name(),
        })
    }

    pub fn intern(&mut self, name: &str) -> Result<CellIndex> {
        self.cells.intern(name)
    }

    pub(crate) fn symbol_text(&self, sym: CellIndex) -> String {
        self.cells
            .symbol_name(sym)
            .map_or_else(|| format!("#{}", sym), str::to_string)
    }

    /// Allocates a string payload and returns an owning cell.
    pub(crate) fn new_string(&mut self, text: &str) -> Result<Cell> {
        let addr = payload::alloc_string(&mut self.heap, text)?;
        Ok(Cell::new(CellType::String, 0, addr))
    }

    pub(crate) fn string_of(&self, cell: Cell) -> Result<String> {
        payload::read_string(&self.heap, cell.value)
    }

    pub(crate) fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Text written by `.` and `emit` so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}
