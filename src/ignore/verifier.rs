//! Semantic checks for parsed ignore files
//!
//! Problems found here never abort loading: the offending expression or
//! filter is dropped and reported as a [`VerificationWarning`].

use super::ast::{Expression, Filter, IgnoreFile, LiteralValue, Operands};
use crate::position::Location;
use crate::warnings::{self, AttributeType, WarningType};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationWarning {
    pub message: String,
    pub file: String,
    pub start: Location,
    pub end: Location,
    /// Ignore file lines covered by the span
    pub lines: Vec<String>,
}

impl fmt::Display for VerificationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file, self.start.line, self.start.column, self.message
        )
    }
}

struct Verifier<'a> {
    filename: &'a str,
    lines: Vec<&'a str>,
    warnings: Vec<VerificationWarning>,
}

impl<'a> Verifier<'a> {
    fn warn(&mut self, message: String, start: Location, end: Location) {
        let lines = (start.line..=end.line)
            .filter_map(|line| line.checked_sub(1))
            .filter_map(|index| self.lines.get(index))
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        self.warnings.push(VerificationWarning {
            message,
            file: self.filename.to_string(),
            start,
            end,
            lines,
        });
    }

    fn verify_filter(&mut self, filter: Filter) -> Option<Filter> {
        let Some(ty) = warnings::lookup(&filter.name) else {
            self.warn(
                format!("Ignoring filter with unknown warning type \"{}\".", filter.name),
                filter.start,
                filter.end,
            );
            return None;
        };
        let Filter {
            name,
            expressions,
            start,
            end,
        } = filter;
        let expressions = expressions
            .into_iter()
            .filter(|expression| self.verify_expression(ty, expression))
            .collect();
        Some(Filter {
            name,
            expressions,
            start,
            end,
        })
    }

    fn verify_expression(&mut self, ty: &WarningType, expression: &Expression) -> bool {
        let operator = expression.operator.name();
        let problem = match expression.operands() {
            Operands::BothNames => Some(format!("Ignoring {operator} expression with missing constant.")),
            Operands::BothLiterals => Some(format!("Ignoring {operator} expression with missing name.")),
            Operands::Comparison { name, literal, .. } => match ty.attribute(name) {
                None => Some(format!(
                    "Ignoring {operator} expression with \"{name}\". \"{}\" doesn't have such an attribute to compare to.",
                    ty.name
                )),
                Some((_, attribute_type)) if !accepts(attribute_type, literal) => Some(format!(
                    "Ignoring {operator} expression. \"{name}\" is not of type {}.",
                    literal.type_name()
                )),
                Some(_) => None,
            },
        };
        match problem {
            Some(message) => {
                self.warn(message, expression.start, expression.end);
                false
            }
            None => true,
        }
    }
}

fn accepts(attribute_type: AttributeType, literal: &LiteralValue) -> bool {
    matches!(
        (attribute_type, literal),
        (AttributeType::String, LiteralValue::String(_)) | (AttributeType::Integer, LiteralValue::Integer(_))
    )
}

/// Checks filters against the warning registry.
///
/// Returns the usable filters, with invalid expressions stripped and unknown
/// filters dropped, together with a warning for each problem. `source` is the
/// ignore file text and only feeds the context lines of the warnings.
pub fn verify(file: IgnoreFile, source: &str) -> (Vec<Filter>, Vec<VerificationWarning>) {
    let mut verifier = Verifier {
        filename: &file.filename,
        lines: source.split('\n').collect(),
        warnings: Vec::new(),
    };
    let filters = file
        .filters
        .into_iter()
        .filter_map(|filter| verifier.verify_filter(filter))
        .collect();
    (filters, verifier.warnings)
}
