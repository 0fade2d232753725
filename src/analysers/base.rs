//! Shared analyser state and check dispatch

use super::AnalysisError;
use crate::models::AnalyserKind;
use crate::module::Module;
use crate::position::{physical_lines, LineRange, Location, LogicalLineIndex};
use crate::tokenizer::{tokenize, TokenizationError};
use crate::warnings::{Warning, WarningKind};
use std::collections::HashMap;
use std::hash::Hash;

/// One analysis pass over one module.
///
/// An analyser is created for a single module, run once and dropped, so any
/// state a check needs (an indentation stack, a future-import flag) lives in
/// the analyser and starts fresh for every file.
pub trait Analyser: Sized {
    const KIND: AnalyserKind;

    /// Warnings emitted so far.
    fn into_warnings(self) -> Vec<Warning>;

    /// Runs the pass and returns its warnings in emission order.
    fn analyse(self) -> Result<Vec<Warning>, AnalysisError> {
        Ok(self.into_warnings())
    }
}

/// Routes a value of kind `K` to the checks registered for that kind.
///
/// Built once from a flat `(kind, check)` table; checks registered for the
/// same kind run in table order.
pub struct Dispatcher<K, C> {
    checks: HashMap<K, Vec<C>>,
}

impl<K: Eq + Hash + Copy, C: Copy> Dispatcher<K, C> {
    pub fn new(table: &[(K, C)]) -> Self {
        let mut checks: HashMap<K, Vec<C>> = HashMap::new();
        for (kind, check) in table {
            checks.entry(*kind).or_default().push(*check);
        }
        Self { checks }
    }

    pub fn checks(&self, kind: K) -> &[C] {
        self.checks.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Line caches and warning collection common to the token, CST and AST
/// analysers.
pub struct AnalyserBase<'m> {
    module: &'m Module,
    physical_lines: Vec<String>,
    logical_lines: LogicalLineIndex,
    warnings: Vec<Warning>,
}

impl<'m> AnalyserBase<'m> {
    pub fn new(module: &'m Module) -> Result<Self, TokenizationError> {
        let physical_lines = physical_lines(module.source());
        let logical_lines = LogicalLineIndex::from_tokens(&physical_lines, tokenize(module.source()))?;
        Ok(Self {
            module,
            physical_lines,
            logical_lines,
            warnings: Vec::new(),
        })
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    pub fn logical_range(&self, lineno: usize) -> LineRange {
        self.logical_lines.range_of(lineno)
    }

    /// From the start of the first to the end of the last physical line of
    /// the logical line containing `lineno`.
    pub fn logical_span(&self, lineno: usize) -> (Location, Location) {
        let range = self.logical_range(lineno);
        let width = self
            .physical_lines
            .get(range.last.saturating_sub(1))
            .map(|line| line.chars().count())
            .unwrap_or(0);
        (Location::new(range.first, 0), Location::new(range.last, width))
    }

    pub fn emit(&mut self, kind: WarningKind, message: impl Into<String>, start: Location, end: Location) {
        let lines = self.logical_lines.lines_between(start, end);
        let warning = Warning::new(kind, message, self.module.name(), start, end).with_lines(lines);
        self.warnings.push(warning);
    }

    /// Emits a warning spanning the logical line that contains `lineno`.
    pub fn emit_for_line(&mut self, kind: WarningKind, message: impl Into<String>, lineno: usize) {
        let (start, end) = self.logical_span(lineno);
        self.emit(kind, message, start, end);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
