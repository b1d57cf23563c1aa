//! Runtime core: the byte heap, the cell store, activations, tasks and the
//! threaded-code interpreter that ties them together.
//!
//! Heap payloads are reference counted. A cell of a heap-backed type owns
//! one reference; arrays release their elements with their last reference.
//! Nothing collects cycles, so an array stored into itself leaks.

pub mod activation;
pub mod builtin_function;
pub mod builtins;
pub mod cell;
pub mod dictionary;
pub mod heap;
pub mod host_value;
pub mod leak_detector;
pub mod payload;
pub mod scheduler;
pub mod task;
pub mod vm;
