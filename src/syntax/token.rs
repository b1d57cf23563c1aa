use std::fmt;

use crate::error::{Result, VmError};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i32),
    Float(f32),
    Str(String),
    /// `'name`
    Symbol(String),
    /// `&name`, a reference to a compiled word.
    FnRef(String),
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize) -> Self {
        Self { kind, line }
    }

    /// Classifies a whitespace-delimited word. Integer literals must fit in
    /// an `i32`.
    pub fn classify(word: String, line: usize) -> Result<Self> {
        if looks_numeric(&word) {
            if let Ok(value) = word.parse::<i32>() {
                return Ok(Self::new(TokenKind::Int(value), line));
            }
            if is_integral(&word) {
                return Err(VmError::compile(
                    line,
                    format!("integer literal `{}` is out of range", word),
                ));
            }
            if let Ok(value) = word.parse::<f32>() {
                return Ok(Self::new(TokenKind::Float(value), line));
            }
        }
        let kind = match word.chars().next() {
            Some('\'') if word.len() > 1 => TokenKind::Symbol(word[1..].to_string()),
            Some('&') if word.len() > 1 => TokenKind::FnRef(word[1..].to_string()),
            _ => TokenKind::Word(word),
        };
        Ok(Self::new(kind, line))
    }
}

/// Digits, optionally signed, so that words like `inf` or `-` stay words.
fn looks_numeric(word: &str) -> bool {
    let unsigned = word
        .strip_prefix('-')
        .or_else(|| word.strip_prefix('+'))
        .unwrap_or(word);
    let unsigned = unsigned.strip_prefix('.').unwrap_or(unsigned);
    unsigned.starts_with(|c: char| c.is_ascii_digit())
}

fn is_integral(word: &str) -> bool {
    let digits = word
        .strip_prefix('-')
        .or_else(|| word.strip_prefix('+'))
        .unwrap_or(word);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(value) => write!(f, "{}", value),
            TokenKind::Float(value) => write!(f, "{}", value),
            TokenKind::Str(value) => write!(f, "{:?}", value),
            TokenKind::Symbol(name) => write!(f, "'{}", name),
            TokenKind::FnRef(name) => write!(f, "&{}", name),
            TokenKind::Word(name) => f.write_str(name),
        }
    }
}
