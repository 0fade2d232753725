//! Concrete syntax tree
//!
//! A lossless, immutable bracket tree over the token stream. Every leaf keeps
//! the source text between the previous token and itself (whitespace,
//! comments, line continuations) as its `prefix`, which is what whitespace
//! checks look at.
//!
//! Statements are split on NEWLINE tokens. Inside a statement every bracket
//! pair becomes a group node whose kind is decided from its contents and the
//! node right before it: `foo[...]` is a subscript, `[...]` a list display,
//! `foo(...)` a call, `(a, b)` a tuple and so on.

use crate::analysers::AnalysisError;
use crate::future::FutureFeatures;
use crate::models::PythonVersion;
use crate::position::{LineIndex, Location};
use crate::tokenizer::{tokenize, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    Statement,
    ListDisplay,
    Subscript,
    Slice,
    DictDisplay,
    SetDisplay,
    TupleDisplay,
    Parenthesized,
    CallArguments,
    /// Parameter list of a `def` or bases of a `class`
    Parameters,
    Name,
    Keyword,
    Number,
    String,
    Op,
    Newline,
    EndMarker,
}

impl NodeKind {
    fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Name => Some(NodeKind::Name),
            TokenKind::Keyword => Some(NodeKind::Keyword),
            TokenKind::Number => Some(NodeKind::Number),
            TokenKind::String => Some(NodeKind::String),
            TokenKind::Op => Some(NodeKind::Op),
            TokenKind::Newline => Some(NodeKind::Newline),
            TokenKind::EndMarker => Some(NodeKind::EndMarker),
            TokenKind::Comment | TokenKind::Nl | TokenKind::Indent | TokenKind::Dedent => None,
        }
    }

    pub fn is_bracket_group(&self) -> bool {
        matches!(
            self,
            NodeKind::ListDisplay
                | NodeKind::Subscript
                | NodeKind::Slice
                | NodeKind::DictDisplay
                | NodeKind::SetDisplay
                | NodeKind::TupleDisplay
                | NodeKind::Parenthesized
                | NodeKind::CallArguments
                | NodeKind::Parameters
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Token text for leaves, empty for inner nodes
    pub value: String,
    /// Source text between the previous leaf and this node's first leaf
    pub prefix: String,
    pub start: Location,
    pub end: Location,
    pub children: Vec<Node>,
}

impl Node {
    fn leaf(kind: NodeKind, token: Token, prefix: String) -> Self {
        Self {
            kind,
            value: token.lexeme,
            prefix,
            start: token.start,
            end: token.end,
            children: Vec::new(),
        }
    }

    fn inner(kind: NodeKind, children: Vec<Node>) -> Self {
        let (prefix, start, end) = match (children.first(), children.last()) {
            (Some(first), Some(last)) => (first.prefix.clone(), first.start, last.end),
            _ => (String::new(), Location::new(1, 0), Location::new(1, 0)),
        };
        Self {
            kind,
            value: String::new(),
            prefix,
            start,
            end,
            children,
        }
    }

    pub fn is_op(&self, op: &str) -> bool {
        self.kind == NodeKind::Op && self.value == op
    }

    /// Whether this node's prefix is whitespace on the same line.
    pub fn has_inline_whitespace(&self) -> bool {
        !self.prefix.is_empty() && !self.prefix.contains('\n')
    }

    /// Children between the brackets of a bracket group.
    pub fn bracket_contents(&self) -> &[Node] {
        if self.kind.is_bracket_group() && self.children.len() >= 2 {
            &self.children[1..self.children.len() - 1]
        } else {
            &[]
        }
    }

    pub fn opening_bracket(&self) -> Option<&Node> {
        self.kind
            .is_bracket_group()
            .then(|| self.children.first())
            .flatten()
    }

    pub fn closing_bracket(&self) -> Option<&Node> {
        self.kind
            .is_bracket_group()
            .then(|| self.children.last())
            .flatten()
    }
}

/// Language features that change how a bracket is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    /// `print` is a statement keyword
    pub print_statement: bool,
    /// `exec` is a statement keyword
    pub exec_statement: bool,
}

impl Grammar {
    pub fn new(version: PythonVersion, features: &FutureFeatures) -> Self {
        let legacy = version == PythonVersion::Python2;
        Self {
            print_statement: legacy && !features.print_function(),
            exec_statement: legacy,
        }
    }

    fn is_statement_keyword(&self, name: &str) -> bool {
        (self.print_statement && name == "print") || (self.exec_statement && name == "exec")
    }
}

const SOFT_KEYWORDS: &[&str] = &["match", "case", "type"];

/// Whether a bracket right after `node` is a trailer (call, subscript)
/// rather than the start of a new expression.
fn closes_expression(node: &Node, grammar: Grammar, statement_start: bool) -> bool {
    match node.kind {
        NodeKind::Name => !grammar.is_statement_keyword(&node.value),
        NodeKind::Number | NodeKind::String => true,
        NodeKind::Keyword => match node.value.as_str() {
            "None" | "True" | "False" => true,
            "match" | "case" => !statement_start,
            soft if SOFT_KEYWORDS.contains(&soft) => true,
            _ => false,
        },
        NodeKind::Parameters => false,
        kind => kind.is_bracket_group(),
    }
}

/// The `:` between key and value in each item of a dict display.
///
/// A `lambda` owns the next colon and, until then, the commas between its
/// parameters, so `{f: lambda x, y: x}` has one separator and `{lambda: 1}`
/// none.
pub fn key_separators(contents: &[Node]) -> Vec<&Node> {
    let mut separators = Vec::new();
    let mut lambdas = 0;
    let mut key_done = false;
    for node in contents {
        if node.kind == NodeKind::Keyword && node.value == "lambda" {
            lambdas += 1;
        } else if node.is_op(",") && lambdas == 0 {
            key_done = false;
        } else if node.is_op(":") {
            if lambdas > 0 {
                lambdas -= 1;
            } else if !key_done {
                key_done = true;
                separators.push(node);
            }
        }
    }
    separators
}

fn classify(items: &[Node], siblings: &[Node], grammar: Grammar, statement_level: bool) -> NodeKind {
    let contents = &items[1..items.len() - 1];
    let has_top_level = |op: &str| contents.iter().any(|node| node.is_op(op));
    let trailer = siblings
        .last()
        .is_some_and(|prev| closes_expression(prev, grammar, statement_level && siblings.len() == 1));

    match items[0].value.as_str() {
        "[" if trailer && has_top_level(":") => NodeKind::Slice,
        "[" if trailer => NodeKind::Subscript,
        "[" => NodeKind::ListDisplay,
        "(" if trailer => {
            let defines = siblings.len() >= 2 && {
                let before = &siblings[siblings.len() - 2];
                before.kind == NodeKind::Keyword && matches!(before.value.as_str(), "def" | "class")
            };
            if defines {
                NodeKind::Parameters
            } else {
                NodeKind::CallArguments
            }
        }
        "(" if has_top_level(",") => NodeKind::TupleDisplay,
        "(" => NodeKind::Parenthesized,
        _ => {
            let unpacks = contents.first().is_some_and(|node| node.is_op("**"));
            if contents.is_empty() || unpacks || !key_separators(contents).is_empty() {
                NodeKind::DictDisplay
            } else {
                NodeKind::SetDisplay
            }
        }
    }
}

fn matching_bracket(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

fn syntax_error(message: impl Into<String>, location: Location) -> AnalysisError {
    AnalysisError::Syntax {
        message: message.into(),
        location,
    }
}

/// Parses `source` into a [`NodeKind::Module`] node whose children are the
/// statements followed by the end marker.
pub fn parse(source: &str, grammar: Grammar) -> Result<Node, AnalysisError> {
    let index = LineIndex::new(source);
    let mut statements: Vec<Node> = Vec::new();
    // frames[0] collects the current statement, one frame per open bracket
    let mut frames: Vec<Vec<Node>> = vec![Vec::new()];
    let mut previous_end = Location::new(1, 0);

    for token in tokenize(source) {
        let token = token?;
        let Some(kind) = NodeKind::from_token(token.kind) else {
            continue;
        };
        let prefix = index.slice(previous_end, token.start).to_string();
        previous_end = token.end;
        let leaf = Node::leaf(kind, token, prefix);

        match (leaf.kind, leaf.value.as_str()) {
            (NodeKind::Op, "(" | "[" | "{") => frames.push(vec![leaf]),
            (NodeKind::Op, ")" | "]" | "}") => {
                if frames.len() == 1 {
                    return Err(syntax_error(format!("unmatched '{}'", leaf.value), leaf.start));
                }
                let mut items = frames.pop().unwrap_or_default();
                let expected = matching_bracket(&items[0].value);
                if leaf.value != expected {
                    return Err(syntax_error(
                        format!("closing '{}' does not match '{}'", leaf.value, items[0].value),
                        leaf.start,
                    ));
                }
                items.push(leaf);
                let statement_level = frames.len() == 1;
                let siblings = frames.last_mut().map(std::mem::take).unwrap_or_default();
                let group_kind = classify(&items, &siblings, grammar, statement_level);
                if let Some(frame) = frames.last_mut() {
                    *frame = siblings;
                    frame.push(Node::inner(group_kind, items));
                }
            }
            (NodeKind::Newline, _) | (NodeKind::EndMarker, _) => {
                if frames.len() > 1 {
                    let open = &frames[frames.len() - 1][0];
                    return Err(syntax_error(format!("'{}' was never closed", open.value), open.start));
                }
                let is_end = leaf.kind == NodeKind::EndMarker;
                if is_end {
                    if !frames[0].is_empty() {
                        statements.push(Node::inner(NodeKind::Statement, std::mem::take(&mut frames[0])));
                    }
                    statements.push(leaf);
                } else {
                    frames[0].push(leaf);
                    statements.push(Node::inner(NodeKind::Statement, std::mem::take(&mut frames[0])));
                }
            }
            _ => {
                if let Some(frame) = frames.last_mut() {
                    frame.push(leaf);
                }
            }
        }
    }

    Ok(Node::inner(NodeKind::Module, statements))
}

/// Nodes of `root` in post-order: children before their parent.
pub fn post_order(root: &Node) -> Vec<&Node> {
    fn visit<'n>(node: &'n Node, out: &mut Vec<&'n Node>) {
        for child in &node.children {
            visit(child, out);
        }
        out.push(node);
    }
    let mut out = Vec::new();
    visit(root, &mut out);
    out
}
