//! Indentation checks driven by the token stream

use super::base::{Analyser, AnalyserBase, Dispatcher};
use super::AnalysisError;
use crate::models::AnalyserKind;
use crate::module::Module;
use crate::tokenizer::{tokenize, Token, TokenKind, TokenizationError};
use crate::warnings::{Warning, WarningKind};
use once_cell::sync::Lazy;

/// Columns a tab advances the indentation by.
const TAB_WIDTH: isize = 8;

const MIXED_TABS_AND_SPACES: &str = "Tabs and spaces are mixed. This is disallowed on Python 3 and \
     inconsistent. Use either tabs or spaces exclusively, preferably spaces.";

type TokenCheck = fn(&mut TokenAnalyser<'_>, &Token);

static CHECKS: Lazy<Dispatcher<TokenKind, TokenCheck>> = Lazy::new(|| {
    Dispatcher::new(&[
        (TokenKind::Indent, check_indentation as TokenCheck),
        (TokenKind::Dedent, pop_indentation as TokenCheck),
        (TokenKind::Newline, check_mixed_tabs_and_spaces as TokenCheck),
    ])
});

pub struct TokenAnalyser<'m> {
    base: AnalyserBase<'m>,
    /// Indentation added by each open block
    indentation_stack: Vec<isize>,
}

impl<'m> TokenAnalyser<'m> {
    pub fn new(module: &'m Module) -> Result<Self, TokenizationError> {
        Ok(Self {
            base: AnalyserBase::new(module)?,
            indentation_stack: Vec::new(),
        })
    }
}

impl Analyser for TokenAnalyser<'_> {
    const KIND: AnalyserKind = AnalyserKind::Token;

    fn into_warnings(self) -> Vec<Warning> {
        self.base.into_warnings()
    }

    fn analyse(mut self) -> Result<Vec<Warning>, AnalysisError> {
        for token in tokenize(self.base.module().source()) {
            let token = token?;
            for check in CHECKS.checks(token.kind) {
                check(&mut self, &token);
            }
        }
        Ok(self.into_warnings())
    }
}

fn indentation_width(whitespace: &str) -> isize {
    whitespace
        .chars()
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

fn check_indentation(analyser: &mut TokenAnalyser<'_>, token: &Token) {
    let current: isize = analyser.indentation_stack.iter().sum();
    let added = indentation_width(&token.lexeme) - current;
    if added != 4 {
        analyser.base.emit(
            WarningKind::WrongNumberOfIndentationSpaces,
            format!("Indented by {added} spaces instead of 4 as demanded by PEP 8"),
            token.start,
            token.end,
        );
    }
    analyser.indentation_stack.push(added);
}

fn pop_indentation(analyser: &mut TokenAnalyser<'_>, _token: &Token) {
    analyser
        .indentation_stack
        .pop()
        .expect("tokenizer emitted a DEDENT without a matching INDENT");
}

fn check_mixed_tabs_and_spaces(analyser: &mut TokenAnalyser<'_>, token: &Token) {
    let line = &token.logical_line;
    let leading = &line[..line.len() - line.trim_start().len()];
    if leading.contains(' ') && leading.contains('\t') {
        analyser
            .base
            .emit(WarningKind::MixedTabsAndSpaces, MIXED_TABS_AND_SPACES, token.start, token.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Location;

    fn check_code(code: &str) -> Vec<Warning> {
        let module = Module::new("test.py", code);
        TokenAnalyser::new(&module).unwrap().analyse().unwrap()
    }

    #[test]
    fn test_four_spaces_pass() {
        assert!(check_code("def foo():\n    pass\n").is_empty());
    }

    #[test]
    fn test_two_spaces() {
        let warnings = check_code("def foo():\n  pass\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::WrongNumberOfIndentationSpaces);
        assert_eq!(
            warnings[0].message,
            "Indented by 2 spaces instead of 4 as demanded by PEP 8"
        );
        assert_eq!(warnings[0].start, Location::new(2, 0));
        assert_eq!(warnings[0].end, Location::new(2, 2));
    }

    #[test]
    fn test_nested_indentation_is_relative() {
        let code = "class A:\n    def f(self):\n        if x:\n              y = 1\n";
        let warnings = check_code(code);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].message,
            "Indented by 6 spaces instead of 4 as demanded by PEP 8"
        );
        assert_eq!(warnings[0].start, Location::new(4, 0));
        assert_eq!(warnings[0].end, Location::new(4, 14));
    }

    #[test]
    fn test_fires_once_per_indent() {
        let code = "def foo():\n  a = 1\n  b = 2\n  c = 3\n";
        assert_eq!(check_code(code).len(), 1);
    }

    #[test]
    fn test_stack_stays_balanced_after_warning() {
        let code = "if a:\n  if b:\n      c = 1\n  d = 2\ne = 3\n";
        let warnings = check_code(code);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].message,
            "Indented by 2 spaces instead of 4 as demanded by PEP 8"
        );
    }

    #[test]
    fn test_tab_counts_as_eight() {
        let warnings = check_code("if a:\n\tb = 1\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].message,
            "Indented by 8 spaces instead of 4 as demanded by PEP 8"
        );
    }

    #[test]
    fn test_mixed_tabs_and_spaces() {
        let code = "if True:\n    if True:\n    \tpass\n";
        let warnings: Vec<_> = check_code(code)
            .into_iter()
            .filter(|w| w.kind == WarningKind::MixedTabsAndSpaces)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].start, Location::new(3, 9));
        assert_eq!(warnings[0].end, Location::new(3, 10));
    }

    fn mixed_lines(code: &str) -> Vec<usize> {
        check_code(code)
            .into_iter()
            .filter(|w| w.kind == WarningKind::MixedTabsAndSpaces)
            .map(|w| w.lineno())
            .collect()
    }

    #[test]
    fn test_mixed_indentation_in_either_order() {
        assert_eq!(mixed_lines("if True:\n \tpass\n"), vec![2]);
        assert_eq!(mixed_lines("if True:\n\t  pass\n"), vec![2]);
        assert_eq!(mixed_lines("if True:\n\tpass\n"), Vec::<usize>::new());
    }

    #[test]
    fn test_tab_after_spaces_is_measured() {
        let warnings: Vec<_> = check_code("if True:\n  \tpass\n")
            .into_iter()
            .filter(|w| w.kind == WarningKind::WrongNumberOfIndentationSpaces)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].message,
            "Indented by 10 spaces instead of 4 as demanded by PEP 8"
        );
        assert_eq!(warnings[0].end, Location::new(2, 3));
    }
}
