//! String literals

use crate::{
    error::{Result, VmError},
    syntax::token::{Token, TokenKind},
};

use super::Lexer;

impl Lexer {
    /// Entry: the current char is the opening quote.
    pub(super) fn read_string(&mut self) -> Result<Token> {
        let line = self.line;
        self.read_char();
        let mut text = String::new();
        loop {
            match self.read_char() {
                Some('"') => return Ok(Token::new(TokenKind::Str(text), line)),
                Some('\\') => match self.read_char() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('0') => text.push('\0'),
                    Some(c) => text.push(c),
                    None => break,
                },
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(VmError::compile(line, "unterminated string literal"))
    }
}
