//! Source front end: tokens, the lexer and compile-time state.

pub mod compiler;
pub mod lexer;
pub mod token;
