//! Whitespace placement inside brackets

use super::base::{Analyser, AnalyserBase, Dispatcher};
use super::AnalysisError;
use crate::cst::{self, key_separators, Grammar, Node, NodeKind};
use crate::future::detect_future_features;
use crate::models::{AnalyserKind, PythonVersion};
use crate::module::Module;
use crate::tokenizer::TokenizationError;
use crate::warnings::{Warning, WarningKind};
use once_cell::sync::Lazy;

type NodeCheck = fn(&mut CstAnalyser<'_>, &Node);

static CHECKS: Lazy<Dispatcher<NodeKind, NodeCheck>> = Lazy::new(|| {
    Dispatcher::new(&[
        (NodeKind::ListDisplay, check_list as NodeCheck),
        (NodeKind::Subscript, check_subscript as NodeCheck),
        (NodeKind::Slice, check_slice as NodeCheck),
        (NodeKind::DictDisplay, check_dict as NodeCheck),
        (NodeKind::SetDisplay, check_set as NodeCheck),
        (NodeKind::TupleDisplay, check_tuple as NodeCheck),
        (NodeKind::CallArguments, check_call_arguments as NodeCheck),
    ])
});

pub struct CstAnalyser<'m> {
    base: AnalyserBase<'m>,
    grammar: Grammar,
}

impl<'m> CstAnalyser<'m> {
    pub fn new(module: &'m Module, python_version: PythonVersion) -> Result<Self, TokenizationError> {
        let features = detect_future_features(module.source());
        Ok(Self {
            base: AnalyserBase::new(module)?,
            grammar: Grammar::new(python_version, &features),
        })
    }

    fn flag(&mut self, node: &Node, what: &str) {
        self.base.emit_for_line(
            WarningKind::ExtraneousWhitespace,
            format!("Extraneous whitespace {what}."),
            node.start.line,
        );
    }

    /// Flags whitespace after the opening and before the closing bracket,
    /// or inside the brackets when there is nothing between them.
    fn check_brackets(&mut self, node: &Node, empty: Option<&str>, beginning: &str, end: &str) {
        let Some(closing) = node.closing_bracket() else {
            return;
        };
        match node.bracket_contents().first() {
            None => {
                if let Some(empty) = empty {
                    if closing.has_inline_whitespace() {
                        self.flag(node, empty);
                    }
                }
            }
            Some(first) => {
                if first.has_inline_whitespace() {
                    self.flag(node, beginning);
                }
                if closing.has_inline_whitespace() {
                    self.flag(node, end);
                }
            }
        }
    }

    /// Flags whitespace before each top-level `separator`.
    fn check_separators(&mut self, node: &Node, separator: &str, what: &str) {
        let count = node
            .bracket_contents()
            .iter()
            .filter(|child| child.is_op(separator) && child.has_inline_whitespace())
            .count();
        for _ in 0..count {
            self.flag(node, what);
        }
    }

    fn check_key_separators(&mut self, node: &Node, what: &str) {
        let count = key_separators(node.bracket_contents())
            .into_iter()
            .filter(|colon| colon.has_inline_whitespace())
            .count();
        for _ in 0..count {
            self.flag(node, what);
        }
    }

    fn check_before_opening(&mut self, node: &Node, what: &str) {
        if node.opening_bracket().is_some_and(Node::has_inline_whitespace) {
            self.flag(node, what);
        }
    }

    fn visit(&mut self, node: &Node) {
        for child in &node.children {
            self.visit(child);
        }
        for check in CHECKS.checks(node.kind) {
            check(self, node);
        }
    }
}

impl Analyser for CstAnalyser<'_> {
    const KIND: AnalyserKind = AnalyserKind::Cst;

    fn into_warnings(self) -> Vec<Warning> {
        self.base.into_warnings()
    }

    fn analyse(mut self) -> Result<Vec<Warning>, AnalysisError> {
        let tree = cst::parse(self.base.module().source(), self.grammar)?;
        self.visit(&tree);
        Ok(self.into_warnings())
    }
}

fn check_list(analyser: &mut CstAnalyser<'_>, node: &Node) {
    analyser.check_brackets(
        node,
        Some("in empty list"),
        "at the beginning of a list",
        "at the end of a list",
    );
    analyser.check_separators(node, ",", "before comma in list");
}

fn check_subscript(analyser: &mut CstAnalyser<'_>, node: &Node) {
    analyser.check_before_opening(node, "before slicing or indexing");
    analyser.check_brackets(
        node,
        None,
        "at the beginning of slicing or indexing",
        "at the end of slicing or indexing",
    );
}

fn check_slice(analyser: &mut CstAnalyser<'_>, node: &Node) {
    analyser.check_before_opening(node, "before slicing or indexing");
    analyser.check_brackets(node, None, "at the beginning of slicing", "at the end of slicing");
}

fn check_dict(analyser: &mut CstAnalyser<'_>, node: &Node) {
    analyser.check_brackets(
        node,
        Some("in empty dict"),
        "at beginning of dict",
        "at end of dict",
    );
    analyser.check_key_separators(node, "before colon in dict");
}

fn check_set(analyser: &mut CstAnalyser<'_>, node: &Node) {
    analyser.check_brackets(node, None, "at beginning of set", "at end of set");
    analyser.check_separators(node, ",", "before comma in set");
}

fn check_tuple(analyser: &mut CstAnalyser<'_>, node: &Node) {
    analyser.check_brackets(node, None, "at beginning of tuple", "at end of tuple");
    analyser.check_separators(node, ",", "before comma in tuple");
}

fn check_call_arguments(analyser: &mut CstAnalyser<'_>, node: &Node) {
    analyser.check_before_opening(node, "before arguments of function call");
    analyser.check_brackets(
        node,
        Some("in arguments of function call"),
        "at beginning of function call arguments",
        "at end of function call arguments",
    );
    analyser.check_separators(node, ",", "before comma in function call arguments");
}
