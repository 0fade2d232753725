//! Typed token stream over the rustpython lexer
//!
//! The lexer reports `(Tok, TextRange)` pairs in byte offsets. [`TokenStream`]
//! turns them into [`Token`]s with character-based locations, recovers the
//! indentation text carried by INDENT tokens and attaches to every token the
//! logical line it belongs to.

use crate::position::{LineIndex, LineRange, Location};
use rustpython_parser::lexer::{lex, LexResult};
use rustpython_parser::{Mode, Tok};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::iter::Peekable;
use thiserror::Error;

/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    Keyword,
    Comment,
    Newline,
    Nl,
    Indent,
    Dedent,
    EndMarker,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Name => "NAME",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Op => "OP",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Comment => "COMMENT",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Nl => "NL",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::EndMarker => "ENDMARKER",
        }
    }

    /// Tokens that carry no code of their own.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Comment | TokenKind::Nl | TokenKind::Indent | TokenKind::Dedent
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub start: Location,
    pub end: Location,
    /// Source text of the statement this token belongs to, right-trimmed
    pub logical_line: String,
    pub logical_range: LineRange,
}

/// The source could not be split into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({location})")]
pub struct TokenizationError {
    pub message: String,
    pub location: Location,
}

/// Tokenizes `source`.
pub fn tokenize(source: &str) -> TokenStream<'_> {
    TokenStream::new(source)
}

/// Raw token before its logical line is known.
struct Pending {
    kind: TokenKind,
    lexeme: String,
    start: Location,
    end: Location,
}

/// Finite token sequence. Tokens are converted one logical line at a time;
/// after the first error the stream ends.
pub struct TokenStream<'src> {
    index: LineIndex<'src>,
    lines: Vec<&'src str>,
    lexer: Peekable<std::vec::IntoIter<LexResult>>,
    ready: VecDeque<Token>,
    finished: bool,
}

impl<'src> TokenStream<'src> {
    fn new(source: &'src str) -> Self {
        let lexed = lex_until_error(&untabify_indentation(source));
        Self {
            index: LineIndex::new(source),
            lines: source.lines().collect(),
            lexer: lexed.into_iter().peekable(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    fn source(&self) -> &'src str {
        self.index.text()
    }

    /// Location of a lexer error. The lexer reports most errors after
    /// consuming the offending character, so an error raised by a line
    /// terminator is moved back onto the line it ends.
    fn error_location(&self, offset: usize) -> Location {
        let source = self.source();
        let mut offset = offset.min(source.len());
        let bytes = source.as_bytes();
        if offset > 0 && bytes[offset - 1] == b'\n' {
            offset -= 1;
            if offset > 0 && bytes[offset - 1] == b'\r' {
                offset -= 1;
            }
        }
        self.index.location(offset)
    }

    /// Start of the next token the lexer will report.
    fn next_token_start(&mut self) -> Option<usize> {
        match self.lexer.peek() {
            Some(Ok((_, range))) => Some(range.start().to_usize()),
            _ => None,
        }
    }

    fn convert(&mut self, tok: Tok, start: usize, end: usize) -> Option<Pending> {
        let source = self.source();
        let text = source.get(start..end).unwrap_or("");
        let kind = match tok {
            Tok::Name { .. } => TokenKind::Name,
            Tok::Int { .. } | Tok::Float { .. } | Tok::Complex { .. } => TokenKind::Number,
            Tok::String { .. } => TokenKind::String,
            Tok::Newline => TokenKind::Newline,
            Tok::EndOfFile => return None,
            Tok::Indent => {
                let at = self.next_token_start().unwrap_or(end);
                let location = self.index.location(at);
                let line = self.lines.get(location.line - 1).copied().unwrap_or("");
                let whitespace: String = line
                    .chars()
                    .take_while(|c| *c == ' ' || *c == '\t' || *c == '\x0c')
                    .collect();
                let width = whitespace.chars().count();
                return Some(Pending {
                    kind: TokenKind::Indent,
                    lexeme: whitespace,
                    start: Location::new(location.line, 0),
                    end: Location::new(location.line, width),
                });
            }
            Tok::Dedent => {
                let at = self.next_token_start().unwrap_or(end);
                let location = self.index.location(at);
                return Some(Pending {
                    kind: TokenKind::Dedent,
                    lexeme: String::new(),
                    start: location,
                    end: location,
                });
            }
            _ if text.is_empty() => return None,
            _ if text.starts_with('#') => TokenKind::Comment,
            _ if text.trim_matches(|c| c == '\r' || c == '\n').is_empty() => TokenKind::Nl,
            _ if text.starts_with(|c: char| c.is_alphabetic() || c == '_') => TokenKind::Keyword,
            _ => TokenKind::Op,
        };

        let start_location = self.index.location(start);
        let end_location = if kind == TokenKind::Newline {
            Location::new(
                start_location.line,
                start_location.column + text.chars().count(),
            )
        } else {
            self.index.location(end)
        };
        Some(Pending {
            kind,
            lexeme: text.to_string(),
            start: start_location,
            end: end_location,
        })
    }

    /// Reads raw tokens up to and including the next NEWLINE (or a
    /// standalone NL, or the end of input) and queues them.
    fn fill_logical_line(&mut self) -> Result<(), TokenizationError> {
        let mut pending: Vec<Pending> = Vec::new();
        loop {
            match self.lexer.next() {
                None => {
                    let location = self.index.location(self.source().len());
                    pending.push(Pending {
                        kind: TokenKind::EndMarker,
                        lexeme: String::new(),
                        start: location,
                        end: location,
                    });
                    self.finished = true;
                    break;
                }
                Some(Err(error)) => {
                    self.finished = true;
                    return Err(TokenizationError {
                        message: error.error.to_string(),
                        location: self.error_location(error.location.to_usize()),
                    });
                }
                Some(Ok((tok, range))) => {
                    let Some(token) = self.convert(tok, range.start().to_usize(), range.end().to_usize()) else {
                        continue;
                    };
                    let kind = token.kind;
                    let standalone = pending.iter().all(|t| t.kind.is_trivia());
                    pending.push(token);
                    if kind == TokenKind::Newline || (kind == TokenKind::Nl && standalone) {
                        break;
                    }
                }
            }
        }

        let first = pending.iter().map(|t| t.start.line).min().unwrap_or(1);
        let last = pending.iter().map(|t| t.end.line).max().unwrap_or(first);
        let range = LineRange::new(first, last);
        let logical_line = self.logical_text(range);
        self.ready.extend(pending.into_iter().map(|t| Token {
            kind: t.kind,
            lexeme: t.lexeme,
            start: t.start,
            end: t.end,
            logical_line: logical_line.clone(),
            logical_range: range,
        }));
        Ok(())
    }

    fn logical_text(&self, range: LineRange) -> String {
        let first = range.first.saturating_sub(1).min(self.lines.len());
        let last = range.last.min(self.lines.len()).max(first);
        self.lines[first..last].join("\n").trim_end().to_string()
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Result<Token, TokenizationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.ready.pop_front() {
                return Some(Ok(token));
            }
            if self.finished {
                return None;
            }
            if let Err(error) = self.fill_logical_line() {
                return Some(Err(error));
            }
        }
    }
}

/// Copy of `source` in which every tab of a line's leading whitespace is a
/// space. The rustpython lexer rejects a tab following spaces in indentation
/// while Python 2 accepts it. Both characters are one byte long, so offsets
/// into the copy are offsets into `source`.
fn untabify_indentation(source: &str) -> Cow<'_, str> {
    let has_indent_tab = source.split('\n').any(|line| {
        line.chars()
            .take_while(|c| *c == ' ' || *c == '\t' || *c == '\x0c')
            .any(|c| c == '\t')
    });
    if !has_indent_tab {
        return Cow::Borrowed(source);
    }
    let lines: Vec<String> = source
        .split('\n')
        .map(|line| {
            let indent = line
                .find(|c: char| c != ' ' && c != '\t' && c != '\x0c')
                .unwrap_or(line.len());
            let (leading, rest) = line.split_at(indent);
            format!("{}{}", leading.replace('\t', " "), rest)
        })
        .collect();
    Cow::Owned(lines.join("\n"))
}

/// Lexes `source` up to and including the first error.
fn lex_until_error(source: &str) -> Vec<LexResult> {
    let mut results = Vec::new();
    for result in lex(source, Mode::Module) {
        let failed = result.is_err();
        results.push(result);
        if failed {
            break;
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source).collect::<Result<Vec<_>, _>>().unwrap()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokens(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_statement() {
        assert_eq!(
            kinds("x = 1\n"),
            vec![
                TokenKind::Name,
                TokenKind::Op,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::EndMarker
            ]
        );
    }

    #[test]
    fn test_indent_carries_whitespace() {
        let toks = tokens("def foo():\n  pass\n");
        let indent = toks.iter().find(|t| t.kind == TokenKind::Indent).unwrap();
        assert_eq!(indent.lexeme, "  ");
        assert_eq!(indent.start, Location::new(2, 0));
        assert_eq!(indent.end, Location::new(2, 2));
        assert_eq!(toks.iter().filter(|t| t.kind == TokenKind::Dedent).count(), 1);
    }

    #[test]
    fn test_keywords_and_strings() {
        let toks = tokens("if x:\n    y = 'a'\n");
        assert_eq!(toks[0].kind, TokenKind::Keyword);
        assert_eq!(toks[0].lexeme, "if");
        let string = toks.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(string.lexeme, "'a'");
        assert_eq!(string.start, Location::new(2, 8));
    }

    #[test]
    fn test_newline_span_is_one_character() {
        let toks = tokens("a\n");
        let newline = &toks[1];
        assert_eq!(newline.kind, TokenKind::Newline);
        assert_eq!(newline.start, Location::new(1, 1));
        assert_eq!(newline.end, Location::new(1, 2));
    }

    #[test]
    fn test_logical_line_spans_brackets() {
        let toks = tokens("x = (1,\n     2)\n");
        let newline = toks.iter().find(|t| t.kind == TokenKind::Newline).unwrap();
        assert_eq!(newline.logical_line, "x = (1,\n     2)");
        assert_eq!(newline.logical_range, LineRange::new(1, 2));
    }

    #[test]
    fn test_end_marker_after_trailing_newline() {
        let toks = tokens("a\n");
        assert_eq!(toks.last().unwrap().kind, TokenKind::EndMarker);
        assert_eq!(toks.last().unwrap().start, Location::new(2, 0));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let result: Result<Vec<_>, _> = tokenize("x = 'abc\n").collect();
        let error = result.unwrap_err();
        assert_eq!(error.location.line, 1);
    }

    #[test]
    fn test_error_location_stays_on_offending_line() {
        let result: Result<Vec<_>, _> = tokenize("a = 1\nx = 'abc\r\ny = 2\n").collect();
        let error = result.unwrap_err();
        assert_eq!(error.location, Location::new(2, 8));
    }

    #[test]
    fn test_tab_after_spaces_in_indentation() {
        for source in ["if True:\n    \tpass\n", "if True:\n \tpass\n"] {
            let toks = tokens(source);
            let indent = toks.iter().find(|t| t.kind == TokenKind::Indent).unwrap();
            assert!(indent.lexeme.ends_with('\t'), "{source:?}");
            assert_eq!(indent.start, Location::new(2, 0));
            assert_eq!(indent.end, Location::new(2, indent.lexeme.len()));
            let pass = toks.iter().find(|t| t.lexeme == "pass").unwrap();
            assert_eq!(pass.start.column, indent.lexeme.len());
            assert_eq!(pass.logical_line, source.lines().nth(1).unwrap());
        }
    }

    #[test]
    fn test_tabs_in_strings_are_kept() {
        let toks = tokens("x = '''\n\ta'''\n");
        let string = toks.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(string.lexeme, "'''\n\ta'''");
    }
}
