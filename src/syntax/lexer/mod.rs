//! Splits source text into whitespace-delimited tokens.
//!
//! Everything that is not a string literal or a comment is a word; the
//! token layer decides whether a word is a number, symbol or reference.

mod comments;
mod strings;

use crate::{
    error::Result,
    syntax::token::Token,
};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.current_char() else {
                return Ok(None);
            };
            if c == '"' {
                return self.read_string().map(Some);
            }
            let line = self.line;
            let word = self.read_word();
            match word.as_str() {
                "(" => self.skip_paren_comment(line)?,
                "\\" => self.skip_line_comment(),
                _ => return Token::classify(word, line).map(Some),
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn read_char(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.read_char();
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                break;
            }
            word.push(c);
            self.read_char();
        }
        word
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}
