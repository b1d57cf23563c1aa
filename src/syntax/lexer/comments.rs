//! `( stack comments )` and `\ line comments`

use crate::error::{Result, VmError};

use super::Lexer;

impl Lexer {
    /// Entry: the `(` word has been consumed. Skips through the closing `)`.
    pub(super) fn skip_paren_comment(&mut self, line: usize) -> Result<()> {
        while let Some(c) = self.read_char() {
            if c == ')' {
                return Ok(());
            }
        }
        Err(VmError::compile(line, "unterminated ( comment"))
    }

    pub(super) fn skip_line_comment(&mut self) {
        while let Some(c) = self.read_char() {
            if c == '\n' {
                break;
            }
        }
    }
}
