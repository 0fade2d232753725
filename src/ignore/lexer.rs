//! Line based lexer for ignore files
//!
//! Indentation works like Python's: a deeper line opens a block with an
//! `Indent`, a shallower one closes blocks with `Dedent`s and has to land on
//! a level that was open before. Blank lines and `#` comment lines are
//! skipped entirely.

use super::tokens::{Token, TokenKind};
use crate::position::Location;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use thiserror::Error;

/// Token patterns, tried in order on the rest of a line.
static PATTERNS: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    vec![
        (TokenKind::Name, Regex::new(r"^[a-zA-Z][a-zA-Z0-9_\-]*").unwrap()),
        (TokenKind::Operator, Regex::new(r"^(<=|>=|=|<|>)").unwrap()),
        (TokenKind::String, Regex::new(r#"^"[^"]*""#).unwrap()),
        (TokenKind::Integer, Regex::new(r"^[0-9]+").unwrap()),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LexingError {
    pub message: String,
    pub location: Location,
}

struct SourceLine<'s> {
    lineno: usize,
    text: &'s str,
    terminated: bool,
}

/// Lazily turns ignore file source into tokens, with one token of
/// lookahead.
pub struct Lexer<'s> {
    lines: VecDeque<SourceLine<'s>>,
    pending: VecDeque<Token>,
    indentation: Vec<usize>,
    end_of_input: Location,
    finished: bool,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        let lines: VecDeque<SourceLine<'s>> = source
            .split_inclusive('\n')
            .enumerate()
            .map(|(i, line)| SourceLine {
                lineno: i + 1,
                text: line.trim_end_matches('\n').trim_end_matches('\r'),
                terminated: line.ends_with('\n'),
            })
            .collect();
        let end_of_input = match lines.back() {
            Some(last) if last.terminated => Location::new(last.lineno + 1, 0),
            Some(last) => Location::new(last.lineno, last.text.chars().count()),
            None => Location::new(1, 0),
        };
        Self {
            lines,
            pending: VecDeque::new(),
            indentation: vec![0],
            end_of_input,
            finished: false,
        }
    }

    /// The next token without consuming it.
    pub fn peek(&mut self) -> Result<Option<&Token>, LexingError> {
        self.fill()?;
        Ok(self.pending.front())
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, LexingError> {
        self.fill()?;
        Ok(self.pending.pop_front())
    }

    fn fill(&mut self) -> Result<(), LexingError> {
        while self.pending.is_empty() && !self.finished {
            match self.lines.pop_front() {
                Some(line) => self.lex_line(line)?,
                None => {
                    while self.indentation.len() > 1 {
                        self.indentation.pop();
                        self.pending.push_back(Token::new(
                            TokenKind::Dedent,
                            "",
                            self.end_of_input,
                            self.end_of_input,
                        ));
                    }
                    self.finished = true;
                }
            }
        }
        Ok(())
    }

    fn lex_line(&mut self, line: SourceLine<'s>) -> Result<(), LexingError> {
        let content = line.text.trim_start_matches([' ', '\t']);
        if content.is_empty() || content.starts_with('#') {
            return Ok(());
        }
        let lineno = line.lineno;
        let width = line.text.len() - content.len();
        self.indent_to(lineno, &line.text[..width])?;

        let mut column = width;
        let mut rest = content;
        loop {
            let trimmed = rest.trim_start_matches([' ', '\t']);
            column += rest.len() - trimmed.len();
            rest = trimmed;
            if rest.is_empty() {
                break;
            }
            let matched = PATTERNS
                .iter()
                .find_map(|(kind, regex)| regex.find(rest).map(|m| (*kind, m.as_str())));
            let Some((kind, lexeme)) = matched else {
                return Err(LexingError {
                    message: format!("cannot find matching token at line {lineno}, column {column}"),
                    location: Location::new(lineno, column),
                });
            };
            let length = lexeme.chars().count();
            self.pending.push_back(Token::new(
                kind,
                lexeme,
                Location::new(lineno, column),
                Location::new(lineno, column + length),
            ));
            column += length;
            rest = &rest[lexeme.len()..];
        }

        if line.terminated {
            self.pending.push_back(Token::new(
                TokenKind::Newline,
                "\n",
                Location::new(lineno, column),
                Location::new(lineno + 1, 0),
            ));
        }
        Ok(())
    }

    fn indent_to(&mut self, lineno: usize, whitespace: &str) -> Result<(), LexingError> {
        let width = whitespace.len();
        let current = self.indentation.last().copied().unwrap_or(0);
        if width > current {
            self.indentation.push(width);
            self.pending.push_back(Token::new(
                TokenKind::Indent,
                &whitespace[current..],
                Location::new(lineno, current),
                Location::new(lineno, width),
            ));
            return Ok(());
        }
        while self.indentation.last().is_some_and(|&level| level > width) {
            self.indentation.pop();
            self.pending.push_back(Token::new(
                TokenKind::Dedent,
                "",
                Location::new(lineno, width),
                Location::new(lineno, width),
            ));
        }
        if self.indentation.last() != Some(&width) {
            return Err(LexingError {
                message: format!("unindent does not match any outer indentation level at line {lineno}"),
                location: Location::new(lineno, width),
            });
        }
        Ok(())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexingError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(error) => {
                self.finished = true;
                self.pending.clear();
                self.lines.clear();
                Some(Err(error))
            }
        }
    }
}

/// Lexes all of `source`.
pub fn lex(source: &str) -> Result<Vec<Token>, LexingError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, lexeme: &str, start: (usize, usize), end: (usize, usize)) -> Token {
        Token::new(kind, lexeme, start.into(), end.into())
    }

    #[test]
    fn test_single_name() {
        assert_eq!(
            lex("foo").unwrap(),
            vec![token(TokenKind::Name, "foo", (1, 0), (1, 3))]
        );
    }

    #[test]
    fn test_two_filters() {
        assert_eq!(
            lex("foo\nbar").unwrap(),
            vec![
                token(TokenKind::Name, "foo", (1, 0), (1, 3)),
                token(TokenKind::Newline, "\n", (1, 3), (2, 0)),
                token(TokenKind::Name, "bar", (2, 0), (2, 3)),
            ]
        );
    }

    #[test]
    fn test_block_with_string() {
        assert_eq!(
            lex("foo\n    spam = \"eggs\"").unwrap(),
            vec![
                token(TokenKind::Name, "foo", (1, 0), (1, 3)),
                token(TokenKind::Newline, "\n", (1, 3), (2, 0)),
                token(TokenKind::Indent, "    ", (2, 0), (2, 4)),
                token(TokenKind::Name, "spam", (2, 4), (2, 8)),
                token(TokenKind::Operator, "=", (2, 9), (2, 10)),
                token(TokenKind::String, "\"eggs\"", (2, 11), (2, 17)),
                token(TokenKind::Dedent, "", (2, 17), (2, 17)),
            ]
        );
    }

    #[test]
    fn test_operators() {
        for (op, end) in [("=", 10), ("<", 10), (">", 10), ("<=", 11), (">=", 11)] {
            let tokens = lex(&format!("foo\n    spam {op} 1")).unwrap();
            assert_eq!(tokens[4], token(TokenKind::Operator, op, (2, 9), (2, end)));
            assert_eq!(tokens[5].kind, TokenKind::Integer);
            assert_eq!(tokens[6].kind, TokenKind::Dedent);
        }
    }

    #[test]
    fn test_dedent_before_next_filter() {
        let kinds: Vec<_> = lex("foo\n  a = 1\nbar\n")
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Name,
                TokenKind::Operator,
                TokenKind::Integer,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Name,
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        let tokens = lex("# suppress noisy checks\n\nfoo\n   \n").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], token(TokenKind::Name, "foo", (3, 0), (3, 3)));
    }

    #[test]
    fn test_unknown_character() {
        let error = lex("foo\n    spam ! 1").unwrap_err();
        assert_eq!(error.location, Location::new(2, 9));
        assert_eq!(error.message, "cannot find matching token at line 2, column 9");
    }

    #[test]
    fn test_inconsistent_dedent() {
        let error = lex("foo\n    a = 1\n  b = 2\n").unwrap_err();
        assert_eq!(error.location.line, 3);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("foo bar");
        assert_eq!(lexer.peek().unwrap().map(|t| t.lexeme.clone()), Some("foo".to_string()));
        assert_eq!(lexer.next_token().unwrap().unwrap().lexeme, "foo");
        assert_eq!(lexer.next_token().unwrap().unwrap().lexeme, "bar");
        assert!(lexer.next_token().unwrap().is_none());
    }
}
