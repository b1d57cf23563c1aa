//! Compile-time state: the pending token stream and the code buffers that
//! immediate words emit into.

use std::collections::VecDeque;

use crate::{
    error::{Result, VmError},
    runtime::{
        cell::{Cell, CellIndex},
        task::TaskId,
    },
    syntax::token::Token,
};

/// Open control structure awaiting its closing word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Forward branch whose offset cell sits at this position.
    Forward(usize),
    /// Backward branch target.
    Backward(usize),
}

#[derive(Debug, Default)]
pub struct CodeBuffer {
    /// Symbol of the word being defined; `None` for top-level code.
    pub name: Option<CellIndex>,
    pub cells: Vec<Cell>,
    control: Vec<Control>,
    line: usize,
}

#[derive(Debug)]
pub struct CompileState {
    pub task: TaskId,
    tokens: VecDeque<Token>,
    frames: Vec<CodeBuffer>,
    line: usize,
}

impl CompileState {
    pub fn new(task: TaskId, tokens: Vec<Token>) -> Self {
        Self {
            task,
            tokens: tokens.into(),
            frames: vec![CodeBuffer::default()],
            line: 1,
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.pop_front()?;
        self.line = token.line;
        Some(token)
    }

    pub fn error(&self, message: impl Into<String>) -> VmError {
        VmError::compile(self.line, message)
    }

    fn buffer(&mut self) -> &mut CodeBuffer {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn emit(&mut self, cell: Cell) {
        self.buffer().cells.push(cell);
    }

    /// Position the next emitted cell will occupy.
    pub fn here(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.cells.len())
    }

    pub fn patch(&mut self, position: usize, cell: Cell) {
        if let Some(slot) = self.buffer().cells.get_mut(position) {
            *slot = cell;
        }
    }

    pub fn push_control(&mut self, control: Control) {
        self.buffer().control.push(control);
    }

    pub fn pop_forward(&mut self, word: &str) -> Result<usize> {
        match self.buffer().control.pop() {
            Some(Control::Forward(position)) => Ok(position),
            _ => Err(self.error(format!("`{}` without matching `if`", word))),
        }
    }

    pub fn pop_backward(&mut self, word: &str) -> Result<usize> {
        match self.buffer().control.pop() {
            Some(Control::Backward(position)) => Ok(position),
            _ => Err(self.error(format!("`{}` without matching `begin`", word))),
        }
    }

    pub fn is_defining(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn begin_definition(&mut self, name: CellIndex) {
        let line = self.line;
        self.frames.push(CodeBuffer {
            name: Some(name),
            line,
            ..CodeBuffer::default()
        });
    }

    /// Closes the innermost definition and hands back its buffer.
    pub fn end_definition(&mut self) -> Result<CodeBuffer> {
        if !self.is_defining() {
            return Err(self.error("`;` outside a definition"));
        }
        let frame = self.frames.pop().ok_or(VmError::NotCompiling)?;
        if !frame.control.is_empty() {
            return Err(VmError::compile(
                frame.line,
                "unclosed control structure in definition",
            ));
        }
        Ok(frame)
    }

    /// Hands back the top-level code once every token has been consumed.
    pub fn finish(mut self) -> Result<Vec<Cell>> {
        if let Some(open) = self.frames.get(1) {
            return Err(VmError::compile(open.line, "unterminated definition"));
        }
        let top = self.frames.pop().unwrap_or_default();
        if !top.control.is_empty() {
            return Err(VmError::compile(self.line, "unclosed control structure"));
        }
        Ok(top.cells)
    }
}
