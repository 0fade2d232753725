//! Source positions shared by every analyser
//!
//! Columns are counted in characters, lines are 1-indexed. A [`LineIndex`]
//! converts between byte offsets (what the Python lexer reports) and
//! [`Location`]s, a [`LogicalLineIndex`] maps physical lines to the logical
//! line (complete statement) containing them.

use crate::tokenizer::{Token, TokenizationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// 1-indexed line number
    pub line: usize,
    /// 0-indexed column, counted in characters
    pub column: usize,
}

impl Location {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl From<(usize, usize)> for Location {
    fn from((line, column): (usize, usize)) -> Self {
        Self { line, column }
    }
}

/// An inclusive range of physical line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub first: usize,
    pub last: usize,
}

impl LineRange {
    pub const fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }
}

/// Byte offset <-> [`Location`] conversion for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    text: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub fn new(text: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    pub fn text(&self) -> &'src str {
        self.text
    }

    /// Location of the character starting at `offset`.
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.text.len());
        let line_index = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line_index];
        let column = self
            .text
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - line_start);
        Location::new(line_index + 1, column)
    }

    /// Byte offset of `location`. Columns past the end of a line (including
    /// its terminator) clamp to the start of the next line.
    pub fn offset(&self, location: Location) -> usize {
        let Some(&line_start) = self.line_starts.get(location.line.saturating_sub(1)) else {
            return self.text.len();
        };
        let line_end = self
            .line_starts
            .get(location.line)
            .copied()
            .unwrap_or(self.text.len());
        let line = &self.text[line_start..line_end];
        let column_bytes = line
            .char_indices()
            .nth(location.column)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        line_start + column_bytes
    }

    /// Text between two locations.
    pub fn slice(&self, start: Location, end: Location) -> &'src str {
        let start = self.offset(start);
        let end = self.offset(end).max(start);
        &self.text[start..end]
    }
}

/// Splits `source` into right-trimmed physical lines.
pub fn physical_lines(source: &str) -> Vec<String> {
    source.lines().map(|line| line.trim_end().to_string()).collect()
}

/// A complete statement, possibly spanning several physical lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub range: LineRange,
    pub text: String,
}

/// Maps every physical line to the logical line containing it.
///
/// Lines that belong to no statement (blank lines, comment-only lines) are
/// logical lines of their own.
#[derive(Debug, Clone, Default)]
pub struct LogicalLineIndex {
    lines: Vec<LogicalLine>,
    by_physical_line: Vec<usize>,
}

impl LogicalLineIndex {
    /// Groups the token stream into logical lines: a new logical line starts
    /// whenever a token's logical line begins after the last line already
    /// covered.
    pub fn from_tokens<I>(physical_lines: &[String], tokens: I) -> Result<Self, TokenizationError>
    where
        I: IntoIterator<Item = Result<Token, TokenizationError>>,
    {
        let mut lines: Vec<LogicalLine> = Vec::new();
        let mut covered = 0;
        for token in tokens {
            let token = token?;
            let range = token.logical_range;
            if range.first > covered && range.first <= physical_lines.len() {
                covered = range.last;
                lines.push(LogicalLine {
                    range: LineRange::new(range.first, range.last.min(physical_lines.len())),
                    text: token.logical_line,
                });
            }
        }

        let mut by_physical_line = vec![usize::MAX; physical_lines.len()];
        for (index, logical) in lines.iter().enumerate() {
            for line in logical.range.first..=logical.range.last {
                by_physical_line[line - 1] = index;
            }
        }
        for (i, slot) in by_physical_line.iter_mut().enumerate() {
            if *slot == usize::MAX {
                *slot = lines.len();
                lines.push(LogicalLine {
                    range: LineRange::new(i + 1, i + 1),
                    text: physical_lines[i].clone(),
                });
            }
        }

        Ok(Self {
            lines,
            by_physical_line,
        })
    }

    fn get(&self, lineno: usize) -> Option<&LogicalLine> {
        let index = *self.by_physical_line.get(lineno.checked_sub(1)?)?;
        self.lines.get(index)
    }

    /// First and last physical line of the logical line containing `lineno`.
    pub fn range_of(&self, lineno: usize) -> LineRange {
        self.get(lineno)
            .map(|logical| logical.range)
            .unwrap_or(LineRange::new(lineno, lineno))
    }

    /// The distinct logical lines touching `start.line..=end.line`, in order.
    pub fn lines_between(&self, start: Location, end: Location) -> Vec<String> {
        let mut seen: Option<LineRange> = None;
        let mut result = Vec::new();
        for lineno in start.line..=end.line.max(start.line) {
            if let Some(logical) = self.get(lineno) {
                if seen != Some(logical.range) {
                    seen = Some(logical.range);
                    result.push(logical.text.clone());
                }
            }
        }
        result
    }
}
