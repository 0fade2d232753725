//! Tokens of the ignore file language

use crate::position::Location;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Newline,
    Indent,
    Dedent,
    Operator,
    String,
    Integer,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Name => "Name",
            TokenKind::Newline => "Newline",
            TokenKind::Indent => "Indent",
            TokenKind::Dedent => "Dedent",
            TokenKind::Operator => "Operator",
            TokenKind::String => "String",
            TokenKind::Integer => "Integer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub start: Location,
    pub end: Location,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, start: Location, end: Location) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            start,
            end,
        }
    }
}
