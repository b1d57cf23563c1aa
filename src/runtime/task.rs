use std::fmt;

use crate::{
    error::{Result, VmError},
    runtime::{
        activation::ActId,
        cell::{Cell, CellIndex},
        dictionary::{Dictionaries, Dictionary},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u32);

impl TaskId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Ready,
    Running,
    /// Gave up the processor; requeued when its slice ends.
    Suspended,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Run,
    Compile,
}

/// Operand and return stacks sharing one region.
///
/// The operand stack grows up from slot 0 and the return stack grows down
/// from the end. They overflow when they meet.
#[derive(Debug, Clone)]
pub struct Stacks {
    slots: Vec<Cell>,
    sp: usize,
    rp: usize,
}

impl Stacks {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Cell::VOID; capacity],
            sp: 0,
            rp: capacity,
        }
    }

    pub fn push(&mut self, cell: Cell) -> Result<()> {
        if self.sp >= self.rp {
            return Err(VmError::StackOverflow);
        }
        self.slots[self.sp] = cell;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Cell> {
        if self.sp == 0 {
            return Err(VmError::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.slots[self.sp])
    }

    /// Cell `depth` positions below the top, 0 being the top itself.
    pub fn peek(&self, depth: usize) -> Result<Cell> {
        if depth >= self.sp {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.slots[self.sp - 1 - depth])
    }

    pub fn rpush(&mut self, cell: Cell) -> Result<()> {
        if self.rp <= self.sp {
            return Err(VmError::StackOverflow);
        }
        self.rp -= 1;
        self.slots[self.rp] = cell;
        Ok(())
    }

    pub fn rpop(&mut self) -> Option<Cell> {
        if self.rp == self.slots.len() {
            return None;
        }
        let cell = self.slots[self.rp];
        self.rp += 1;
        Some(cell)
    }

    pub fn depth(&self) -> usize {
        self.sp
    }

    pub fn return_depth(&self) -> usize {
        self.slots.len() - self.rp
    }

    /// Operand stack, bottom first.
    pub fn operands(&self) -> &[Cell] {
        &self.slots[..self.sp]
    }

    /// Return stack, innermost frame first.
    pub fn returns(&self) -> &[Cell] {
        &self.slots[self.rp..]
    }

    /// Empties both stacks, handing back every cell they held.
    pub fn drain(&mut self) -> Vec<Cell> {
        let mut cells = self.slots[..self.sp].to_vec();
        cells.extend_from_slice(&self.slots[self.rp..]);
        self.sp = 0;
        self.rp = self.slots.len();
        cells
    }
}

/// A cooperative thread of execution.
#[derive(Debug, Clone)]
pub struct Task {
    pub parent: Option<TaskId>,
    pub act: ActId,
    pub stacks: Stacks,
    pub ip: CellIndex,
    pub state: TaskState,
    pub mode: Mode,
    pub dictionaries: Dictionaries,
    /// Kept after termination until the host reclaims it.
    pub held: bool,
    /// Error that ended the task, for held tasks.
    pub fault: Option<VmError>,
}

impl Task {
    pub fn new(
        parent: Option<TaskId>,
        act: ActId,
        entry: CellIndex,
        stack_slots: usize,
        dictionaries: Dictionaries,
    ) -> Self {
        Self {
            parent,
            act,
            stacks: Stacks::new(stack_slots),
            ip: entry,
            state: TaskState::Ready,
            mode: Mode::Run,
            dictionaries,
            held: false,
            fault: None,
        }
    }

    /// Dictionary selected by the current mode.
    pub fn active(&self) -> &Dictionary {
        match self.mode {
            Mode::Run => &self.dictionaries.run,
            Mode::Compile => &self.dictionaries.compile,
        }
    }
}
