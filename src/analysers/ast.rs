//! Checks on the abstract syntax tree
//!
//! The tree is walked in pre-order and in source order, so a
//! `from __future__ import division` is always seen before any division that
//! follows it in the file.

use super::base::{Analyser, AnalyserBase, Dispatcher};
use super::AnalysisError;
use crate::future::detect_future_features;
use crate::models::{AnalyserKind, PythonVersion};
use crate::module::Module;
use crate::position::LineIndex;
use crate::tokenizer::{tokenize, TokenKind, TokenizationError};
use crate::warnings::{Warning, WarningKind};
use once_cell::sync::Lazy;
use rustpython_ast::{self as ast, Expr, ExceptHandler, Mod, Operator, Stmt};
use rustpython_parser::{parse, Mode};
use std::borrow::Cow;
use std::collections::HashSet;

const MULTIPLE_IMPORTS: &str = "Multiple imports on one line. Should be on separate ones.";
const STAR_IMPORT: &str = "from ... import * should be avoided.";
const INDISCRIMINATE_EXCEPT: &str = "Never use except without a specific exception.";
const GLOBAL_KEYWORD: &str = "The global keyword should be avoided.";
const PRINT_STATEMENT: &str = "The print statement has been removed in Python 3. Import print() \
     with from __future__ import print_function instead.";
const DIV_STATEMENT: &str =
    "Don't use / without from __future__ import division. Use //, if you really want floor division.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AstNodeKind {
    Import,
    ImportFrom,
    Try,
    Global,
    Print,
    BinOp,
}

/// The nodes checks are registered for.
enum AstNode<'a> {
    Import(&'a ast::StmtImport),
    ImportFrom(&'a ast::StmtImportFrom),
    Try(&'a [ExceptHandler]),
    Global(&'a ast::StmtGlobal),
    /// A legacy print statement, parsed as the `pass` it was masked with
    Print(&'a ast::StmtPass),
    BinOp(&'a ast::ExprBinOp),
}

impl AstNode<'_> {
    fn kind(&self) -> AstNodeKind {
        match self {
            AstNode::Import(_) => AstNodeKind::Import,
            AstNode::ImportFrom(_) => AstNodeKind::ImportFrom,
            AstNode::Try(_) => AstNodeKind::Try,
            AstNode::Global(_) => AstNodeKind::Global,
            AstNode::Print(_) => AstNodeKind::Print,
            AstNode::BinOp(_) => AstNodeKind::BinOp,
        }
    }
}

type AstCheck = fn(&mut AstAnalyser<'_>, &AstNode<'_>);

static CHECKS: Lazy<Dispatcher<AstNodeKind, AstCheck>> = Lazy::new(|| {
    Dispatcher::new(&[
        (AstNodeKind::Import, check_multiple_imports as AstCheck),
        (AstNodeKind::ImportFrom, check_star_import as AstCheck),
        (AstNodeKind::ImportFrom, track_future_division as AstCheck),
        (AstNodeKind::Try, check_indiscriminate_except as AstCheck),
        (AstNodeKind::Global, check_global_keyword as AstCheck),
        (AstNodeKind::Print, check_print_statement as AstCheck),
        (AstNodeKind::BinOp, check_division as AstCheck),
    ])
});

pub struct AstAnalyser<'m> {
    base: AnalyserBase<'m>,
    index: LineIndex<'m>,
    python_version: PythonVersion,
    /// `/` floors on integers unless `division` is imported from `__future__`
    division_is_ambiguous: bool,
    /// Offsets of the `pass` statements standing in for print statements
    print_statements: HashSet<usize>,
}

impl<'m> AstAnalyser<'m> {
    pub fn new(module: &'m Module, python_version: PythonVersion) -> Result<Self, TokenizationError> {
        Ok(Self {
            base: AnalyserBase::new(module)?,
            index: LineIndex::new(module.source()),
            python_version,
            division_is_ambiguous: python_version == PythonVersion::Python2,
            print_statements: HashSet::new(),
        })
    }

    fn emit_at(&mut self, kind: WarningKind, message: &str, offset: usize) {
        let lineno = self.index.location(offset).line;
        self.base.emit_for_line(kind, message, lineno);
    }

    fn dispatch(&mut self, node: AstNode<'_>) {
        for check in CHECKS.checks(node.kind()) {
            check(self, &node);
        }
    }

    fn walk_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FunctionDef(ast::StmtFunctionDef {
                decorator_list,
                args,
                returns,
                body,
                ..
            })
            | Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef {
                decorator_list,
                args,
                returns,
                body,
                ..
            }) => {
                self.walk_exprs(decorator_list);
                self.walk_arguments(args);
                if let Some(returns) = returns {
                    self.walk_expr(returns);
                }
                self.walk_body(body);
            }
            Stmt::ClassDef(ast::StmtClassDef {
                decorator_list,
                bases,
                keywords,
                body,
                ..
            }) => {
                self.walk_exprs(decorator_list);
                self.walk_exprs(bases);
                for keyword in keywords {
                    self.walk_expr(&keyword.value);
                }
                self.walk_body(body);
            }
            Stmt::Return(ast::StmtReturn { value, .. }) => self.walk_optional(value.as_deref()),
            Stmt::Delete(ast::StmtDelete { targets, .. }) => self.walk_exprs(targets),
            Stmt::Assign(ast::StmtAssign { targets, value, .. }) => {
                self.walk_exprs(targets);
                self.walk_expr(value);
            }
            Stmt::AugAssign(ast::StmtAugAssign { target, value, .. }) => {
                self.walk_expr(target);
                self.walk_expr(value);
            }
            Stmt::AnnAssign(ast::StmtAnnAssign {
                target,
                annotation,
                value,
                ..
            }) => {
                self.walk_expr(target);
                self.walk_expr(annotation);
                self.walk_optional(value.as_deref());
            }
            Stmt::For(ast::StmtFor {
                target,
                iter,
                body,
                orelse,
                ..
            })
            | Stmt::AsyncFor(ast::StmtAsyncFor {
                target,
                iter,
                body,
                orelse,
                ..
            }) => {
                self.walk_expr(target);
                self.walk_expr(iter);
                self.walk_body(body);
                self.walk_body(orelse);
            }
            Stmt::While(ast::StmtWhile { test, body, orelse, .. })
            | Stmt::If(ast::StmtIf { test, body, orelse, .. }) => {
                self.walk_expr(test);
                self.walk_body(body);
                self.walk_body(orelse);
            }
            Stmt::With(ast::StmtWith { items, body, .. })
            | Stmt::AsyncWith(ast::StmtAsyncWith { items, body, .. }) => {
                for item in items {
                    self.walk_expr(&item.context_expr);
                    self.walk_optional(item.optional_vars.as_deref());
                }
                self.walk_body(body);
            }
            Stmt::Match(ast::StmtMatch { subject, cases, .. }) => {
                self.walk_expr(subject);
                for case in cases {
                    self.walk_optional(case.guard.as_deref());
                    self.walk_body(&case.body);
                }
            }
            Stmt::Raise(ast::StmtRaise { exc, cause, .. }) => {
                self.walk_optional(exc.as_deref());
                self.walk_optional(cause.as_deref());
            }
            Stmt::Try(ast::StmtTry {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            })
            | Stmt::TryStar(ast::StmtTryStar {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            }) => {
                self.dispatch(AstNode::Try(handlers));
                self.walk_body(body);
                for handler in handlers {
                    let ExceptHandler::ExceptHandler(handler) = handler;
                    self.walk_optional(handler.type_.as_deref());
                    self.walk_body(&handler.body);
                }
                self.walk_body(orelse);
                self.walk_body(finalbody);
            }
            Stmt::Assert(ast::StmtAssert { test, msg, .. }) => {
                self.walk_expr(test);
                self.walk_optional(msg.as_deref());
            }
            Stmt::Import(import) => self.dispatch(AstNode::Import(import)),
            Stmt::ImportFrom(import_from) => self.dispatch(AstNode::ImportFrom(import_from)),
            Stmt::Global(global) => self.dispatch(AstNode::Global(global)),
            Stmt::Expr(ast::StmtExpr { value, .. }) => self.walk_expr(value),
            Stmt::Pass(pass) => {
                if self.print_statements.contains(&pass.range.start().to_usize()) {
                    self.dispatch(AstNode::Print(pass));
                }
            }
            _ => {}
        }
    }

    /// Parameters in source order, each annotation before its default.
    fn walk_arguments(&mut self, args: &ast::Arguments) {
        for arg in args.posonlyargs.iter().chain(&args.args) {
            self.walk_parameter(arg);
        }
        if let Some(vararg) = &args.vararg {
            self.walk_optional(vararg.annotation.as_deref());
        }
        for arg in &args.kwonlyargs {
            self.walk_parameter(arg);
        }
        if let Some(kwarg) = &args.kwarg {
            self.walk_optional(kwarg.annotation.as_deref());
        }
    }

    fn walk_parameter(&mut self, arg: &ast::ArgWithDefault) {
        self.walk_optional(arg.def.annotation.as_deref());
        self.walk_optional(arg.default.as_deref());
    }

    fn walk_optional(&mut self, expr: Option<&Expr>) {
        if let Some(expr) = expr {
            self.walk_expr(expr);
        }
    }

    fn walk_exprs(&mut self, exprs: &[Expr]) {
        for expr in exprs {
            self.walk_expr(expr);
        }
    }

    fn walk_comprehensions(&mut self, generators: &[ast::Comprehension]) {
        for generator in generators {
            self.walk_expr(&generator.target);
            self.walk_expr(&generator.iter);
            self.walk_exprs(&generator.ifs);
        }
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::BinOp(binop) => {
                self.dispatch(AstNode::BinOp(binop));
                self.walk_expr(&binop.left);
                self.walk_expr(&binop.right);
            }
            Expr::BoolOp(ast::ExprBoolOp { values, .. }) => self.walk_exprs(values),
            Expr::NamedExpr(ast::ExprNamedExpr { target, value, .. }) => {
                self.walk_expr(target);
                self.walk_expr(value);
            }
            Expr::UnaryOp(ast::ExprUnaryOp { operand, .. }) => self.walk_expr(operand),
            Expr::Lambda(ast::ExprLambda { args, body, .. }) => {
                self.walk_arguments(args);
                self.walk_expr(body);
            }
            Expr::IfExp(ast::ExprIfExp { test, body, orelse, .. }) => {
                self.walk_expr(body);
                self.walk_expr(test);
                self.walk_expr(orelse);
            }
            Expr::Dict(ast::ExprDict { keys, values, .. }) => {
                for (key, value) in keys.iter().zip(values) {
                    self.walk_optional(key.as_ref());
                    self.walk_expr(value);
                }
            }
            Expr::Set(ast::ExprSet { elts, .. })
            | Expr::List(ast::ExprList { elts, .. })
            | Expr::Tuple(ast::ExprTuple { elts, .. }) => self.walk_exprs(elts),
            Expr::ListComp(ast::ExprListComp { elt, generators, .. })
            | Expr::SetComp(ast::ExprSetComp { elt, generators, .. })
            | Expr::GeneratorExp(ast::ExprGeneratorExp { elt, generators, .. }) => {
                self.walk_expr(elt);
                self.walk_comprehensions(generators);
            }
            Expr::DictComp(ast::ExprDictComp {
                key,
                value,
                generators,
                ..
            }) => {
                self.walk_expr(key);
                self.walk_expr(value);
                self.walk_comprehensions(generators);
            }
            Expr::Await(ast::ExprAwait { value, .. })
            | Expr::YieldFrom(ast::ExprYieldFrom { value, .. })
            | Expr::Attribute(ast::ExprAttribute { value, .. })
            | Expr::Starred(ast::ExprStarred { value, .. }) => self.walk_expr(value),
            Expr::Yield(ast::ExprYield { value, .. }) => self.walk_optional(value.as_deref()),
            Expr::Compare(ast::ExprCompare {
                left, comparators, ..
            }) => {
                self.walk_expr(left);
                self.walk_exprs(comparators);
            }
            Expr::Call(ast::ExprCall {
                func, args, keywords, ..
            }) => {
                self.walk_expr(func);
                self.walk_exprs(args);
                for keyword in keywords {
                    self.walk_expr(&keyword.value);
                }
            }
            Expr::FormattedValue(ast::ExprFormattedValue { value, .. }) => self.walk_expr(value),
            Expr::JoinedStr(ast::ExprJoinedStr { values, .. }) => self.walk_exprs(values),
            Expr::Subscript(ast::ExprSubscript { value, slice, .. }) => {
                self.walk_expr(value);
                self.walk_expr(slice);
            }
            Expr::Slice(ast::ExprSlice {
                lower, upper, step, ..
            }) => {
                self.walk_optional(lower.as_deref());
                self.walk_optional(upper.as_deref());
                self.walk_optional(step.as_deref());
            }
            _ => {}
        }
    }
}

impl Analyser for AstAnalyser<'_> {
    const KIND: AnalyserKind = AnalyserKind::Ast;

    fn into_warnings(self) -> Vec<Warning> {
        self.base.into_warnings()
    }

    fn analyse(mut self) -> Result<Vec<Warning>, AnalysisError> {
        let module = self.base.module();
        let features = detect_future_features(module.source());
        let source = if self.python_version == PythonVersion::Python2 && !features.print_function() {
            let (masked, offsets) = mask_print_statements(module.source())?;
            self.print_statements = offsets;
            Cow::Owned(masked)
        } else {
            Cow::Borrowed(module.source())
        };

        let tree = parse(&source, Mode::Module, module.name()).map_err(|e| AnalysisError::Syntax {
            message: e.error.to_string(),
            location: self.index.location(e.offset.to_usize()),
        })?;
        if let Mod::Module(tree) = &tree {
            self.walk_body(&tree.body);
        }
        Ok(self.into_warnings())
    }
}

/// Replaces every legacy print statement in `source` with a `pass` padded
/// to the same byte length, so the Python 3 parser accepts the module and
/// all offsets stay valid. Returns the masked source and the offsets of the
/// replaced statements.
fn mask_print_statements(source: &str) -> Result<(String, HashSet<usize>), TokenizationError> {
    let index = LineIndex::new(source);
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut open: Option<usize> = None;
    let mut depth = 0usize;
    let mut statement_start = true;

    for token in tokenize(source) {
        let token = token?;
        let is_terminator = depth == 0
            && (matches!(token.kind, TokenKind::Newline | TokenKind::EndMarker) || token.lexeme == ";");
        if is_terminator {
            if let Some(start) = open.take() {
                spans.push((start, index.offset(token.start)));
            }
            statement_start = true;
            continue;
        }
        match token.kind {
            TokenKind::Comment | TokenKind::Nl | TokenKind::Indent | TokenKind::Dedent => continue,
            TokenKind::Op if matches!(token.lexeme.as_str(), "(" | "[" | "{") => depth += 1,
            TokenKind::Op if matches!(token.lexeme.as_str(), ")" | "]" | "}") => {
                depth = depth.saturating_sub(1)
            }
            // `if x: print y`
            TokenKind::Op if token.lexeme == ":" && depth == 0 => {
                statement_start = true;
                continue;
            }
            _ => {}
        }
        if statement_start && open.is_none() && token.kind == TokenKind::Name && token.lexeme == "print" {
            open = Some(index.offset(token.start));
        }
        statement_start = false;
    }

    let mut bytes = source.as_bytes().to_vec();
    for &(start, end) in &spans {
        blank_statement(&mut bytes[start..end]);
    }
    let masked = String::from_utf8(bytes).map_err(|e| TokenizationError {
        message: format!("masking print statements produced invalid text: {e}"),
        location: index.location(0),
    })?;
    Ok((masked, spans.into_iter().map(|(start, _)| start).collect()))
}

/// Overwrites a statement with `pass` followed by spaces. Line breaks stay in
/// place and are escaped so the statement still ends where it used to.
fn blank_statement(statement: &mut [u8]) {
    for byte in statement.iter_mut() {
        if *byte != b'\n' && *byte != b'\r' {
            *byte = b' ';
        }
    }
    statement[..4].copy_from_slice(b"pass");
    for i in 0..statement.len() {
        if statement[i] != b'\n' {
            continue;
        }
        let terminator = if i > 0 && statement[i - 1] == b'\r' { i - 1 } else { i };
        if terminator > 4 && statement[terminator - 1] == b' ' {
            statement[terminator - 1] = b'\\';
        }
    }
}

fn check_multiple_imports(analyser: &mut AstAnalyser<'_>, node: &AstNode<'_>) {
    if let AstNode::Import(import) = node {
        if import.names.len() > 1 {
            analyser.emit_at(
                WarningKind::MultipleImports,
                MULTIPLE_IMPORTS,
                import.range.start().to_usize(),
            );
        }
    }
}

fn check_star_import(analyser: &mut AstAnalyser<'_>, node: &AstNode<'_>) {
    if let AstNode::ImportFrom(import_from) = node {
        if import_from.names.len() == 1 && import_from.names[0].name.as_str() == "*" {
            analyser.emit_at(
                WarningKind::StarImport,
                STAR_IMPORT,
                import_from.range.start().to_usize(),
            );
        }
    }
}

fn track_future_division(analyser: &mut AstAnalyser<'_>, node: &AstNode<'_>) {
    if let AstNode::ImportFrom(import_from) = node {
        let is_future = import_from
            .module
            .as_ref()
            .is_some_and(|module| module.as_str() == "__future__");
        if is_future && import_from.names.iter().any(|alias| alias.name.as_str() == "division") {
            analyser.division_is_ambiguous = false;
        }
    }
}

fn check_indiscriminate_except(analyser: &mut AstAnalyser<'_>, node: &AstNode<'_>) {
    if let AstNode::Try([ExceptHandler::ExceptHandler(handler)]) = node {
        if handler.type_.is_none() {
            analyser.emit_at(
                WarningKind::IndiscriminateExcept,
                INDISCRIMINATE_EXCEPT,
                handler.range.start().to_usize(),
            );
        }
    }
}

fn check_global_keyword(analyser: &mut AstAnalyser<'_>, node: &AstNode<'_>) {
    if let AstNode::Global(global) = node {
        analyser.emit_at(WarningKind::GlobalKeyword, GLOBAL_KEYWORD, global.range.start().to_usize());
    }
}

fn check_print_statement(analyser: &mut AstAnalyser<'_>, node: &AstNode<'_>) {
    if let AstNode::Print(pass) = node {
        analyser.emit_at(WarningKind::PrintStatement, PRINT_STATEMENT, pass.range.start().to_usize());
    }
}

fn check_division(analyser: &mut AstAnalyser<'_>, node: &AstNode<'_>) {
    if let AstNode::BinOp(binop) = node {
        if matches!(binop.op, Operator::Div) && analyser.division_is_ambiguous {
            analyser.emit_at(WarningKind::DivStatement, DIV_STATEMENT, binop.range.start().to_usize());
        }
    }
}
