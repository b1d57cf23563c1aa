//! Error taxonomy for the heap, cell store and interpreter.
//!
//! The byte heap itself never returns these: it reports through its
//! configured hooks and yields the null address or does nothing. The VM
//! layer converts those outcomes into [`VmError`] where a caller needs one.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VmError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// The byte heap could not satisfy an allocation.
    #[error("out of memory: cannot allocate {requested} bytes")]
    OutOfMemory { requested: usize },

    /// A pointer-taking heap operation found a bad magic guard.
    #[error("invalid memory access at address {address:#x}")]
    InvalidMemoryAccess { address: u32 },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack overflow")]
    StackOverflow,

    #[error("unknown builtin: {0}")]
    UnknownBuiltin(String),

    #[error("unknown word: {0}")]
    UnknownWord(String),

    /// The integrity walk hit a block whose guard word does not match.
    #[error("heap corruption detected at address {address:#x}")]
    CorruptionDetected { address: u32 },

    #[error("cell store exhausted")]
    OutOfCells,

    #[error("{op}: expected {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("unknown task: {0}")]
    UnknownTask(u32),

    /// The instruction pointer left the cell store.
    #[error("instruction pointer {0} is outside the cell store")]
    IpOutOfRange(u32),

    #[error("cannot leave the root activation")]
    ScopeUnderflow,

    #[error("no compilation in progress")]
    NotCompiling,

    #[error("no task is running")]
    NoCurrentTask,

    #[error("compile error on line {line}: {message}")]
    Compile { line: usize, message: String },
}

impl VmError {
    pub(crate) fn compile(line: usize, message: impl Into<String>) -> Self {
        VmError::Compile {
            line,
            message: message.into(),
        }
    }

    /// Returns `true` for errors that only end the task that raised them.
    pub fn is_task_fatal(&self) -> bool {
        !matches!(self, VmError::CorruptionDetected { .. })
    }
}
