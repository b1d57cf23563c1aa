use crate::{
    error::{Result, VmError},
    runtime::{
        cell::{Cell, CellIndex, CellType},
        task::{Mode, TaskId},
    },
    syntax::{
        compiler::CompileState,
        lexer,
        token::{Token, TokenKind},
    },
};

use super::{Vm, dispatch::Resolved};

impl Vm {
    /// Compiles `source` on `task` and returns the entry address of its
    /// top-level code, which ends in `next`.
    ///
    /// The task runs in compile mode while its tokens are consumed, so
    /// immediate words come from its compile dictionary. Words defined with
    /// `:` become visible to the task and to every task created afterwards.
    pub fn compile(&mut self, task: TaskId, source: &str) -> Result<CellIndex> {
        let tokens = lexer::tokenize(source)?;
        let previous_task = self.scheduler.current();
        let previous_state = self.compiler.replace(CompileState::new(task, tokens));
        self.scheduler.set_current(Some(task));
        self.set_mode(task, Mode::Compile)?;

        let result = self.compile_tokens();

        if let Some(compiling) = self.scheduler.get_mut(task) {
            compiling.mode = Mode::Run;
        }
        self.scheduler.set_current(previous_task);
        let state = std::mem::replace(&mut self.compiler, previous_state);
        let mut top = result.and_then(|()| state.ok_or(VmError::NotCompiling)?.finish())?;
        top.push(Cell::builtin(self.symbols.next));
        self.cells.append(&top)
    }

    fn set_mode(&mut self, task: TaskId, mode: Mode) -> Result<()> {
        let task = self
            .scheduler
            .get_mut(task)
            .ok_or(VmError::UnknownTask(task.raw()))?;
        task.mode = mode;
        Ok(())
    }

    fn compile_tokens(&mut self) -> Result<()> {
        while let Some(token) = self.compiler_mut()?.next_token() {
            self.compile_token(token)?;
        }
        Ok(())
    }

    fn compile_token(&mut self, token: Token) -> Result<()> {
        let cell = match token.kind {
            TokenKind::Int(value) => Cell::int(value),
            TokenKind::Float(value) => Cell::float(value),
            TokenKind::Str(text) => self.new_string(&text)?,
            TokenKind::Symbol(name) => Cell::symbol(self.intern(&name)?),
            TokenKind::FnRef(name) => {
                let sym = self.intern(&name)?;
                match self.resolve(sym)? {
                    Some(Resolved::Word(address)) => Cell::function(address),
                    _ => return Err(VmError::UnknownWord(name)),
                }
            }
            TokenKind::Word(name) => {
                let sym = self.intern(&name)?;
                match self.resolve(sym)? {
                    Some(Resolved::Builtin(id)) => return self.call_builtin(id),
                    Some(Resolved::Word(_)) if self.is_run_builtin(sym)? => Cell::builtin(sym),
                    Some(Resolved::Word(address)) => Cell::code(address),
                    None => Cell::builtin(sym),
                }
            }
        };
        self.compiler_mut()?.emit(cell);
        Ok(())
    }

    /// A run-time builtin shadows a compiled word of the same name, so the
    /// call stays late-bound.
    fn is_run_builtin(&self, sym: CellIndex) -> Result<bool> {
        Ok(self.task()?.dictionaries.run.builtin(sym).is_some())
    }

    pub(crate) fn compiler_mut(&mut self) -> Result<&mut CompileState> {
        self.compiler.as_mut().ok_or(VmError::NotCompiling)
    }

    /// Appends a finished definition to the cell store and names it in the
    /// compiling task's dictionaries and the defaults.
    pub(crate) fn define_word(&mut self, name: CellIndex, mut code: Vec<Cell>) -> Result<CellIndex> {
        code.push(Cell::builtin(self.symbols.next));
        let address = self.cells.append(&code)?;
        let task = self.compiler_mut()?.task;
        if let Some(task) = self.scheduler.get_mut(task) {
            task.dictionaries.define_word(name, address);
        }
        self.defaults.define_word(name, address);
        tracing::debug!(word = %self.symbol_text(name), address, "define");
        Ok(address)
    }

    /// Emits a branch builtin followed by its offset cell and returns the
    /// offset cell's position.
    pub(crate) fn emit_branch(&mut self, conditional: bool) -> Result<usize> {
        let word = if conditional {
            self.symbols.branch_if_false
        } else {
            self.symbols.branch
        };
        let compiler = self.compiler_mut()?;
        compiler.emit(Cell::builtin(word));
        let at = compiler.here();
        compiler.emit(Cell::new(CellType::Integer, 0, 0));
        Ok(at)
    }
}
