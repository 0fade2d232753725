//! Turns verified filters into a suppression predicate

use super::ast::{ComparisonOperator, Filter, LiteralValue, Operands};
use crate::warnings::{self, Attribute, AttributeValue, Warning, WarningType};
use log::warn;
use std::fmt;

type Predicate = Box<dyn Fn(&Warning) -> bool + Send + Sync>;

/// A single attribute comparison of a filter.
struct Condition {
    attribute: Attribute,
    operator: ComparisonOperator,
    literal: LiteralValue,
    name_on_left: bool,
}

impl Condition {
    fn holds(&self, warning: &Warning) -> bool {
        let ordering = match (warning.attribute(self.attribute), &self.literal) {
            (AttributeValue::String(value), LiteralValue::String(literal)) => value.cmp(literal.as_str()),
            (AttributeValue::Integer(value), LiteralValue::Integer(literal)) => value.cmp(literal),
            _ => return false,
        };
        let ordering = if self.name_on_left {
            ordering
        } else {
            ordering.reverse()
        };
        self.operator.holds(ordering)
    }
}

/// Compiled form of an ignore file.
pub struct IgnoreFilter {
    suppressors: Vec<Predicate>,
}

impl IgnoreFilter {
    /// A filter that suppresses nothing.
    pub fn allow_all() -> Self {
        Self {
            suppressors: Vec::new(),
        }
    }

    pub fn compile(filters: &[Filter]) -> Self {
        let suppressors = filters.iter().filter_map(compile_filter).collect();
        Self { suppressors }
    }

    pub fn is_suppressed(&self, warning: &Warning) -> bool {
        self.suppressors.iter().any(|suppresses| suppresses(warning))
    }

    pub fn should_emit(&self, warning: &Warning) -> bool {
        !self.is_suppressed(warning)
    }

    pub fn len(&self) -> usize {
        self.suppressors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppressors.is_empty()
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl fmt::Debug for IgnoreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreFilter")
            .field("filters", &self.suppressors.len())
            .finish()
    }
}

fn compile_filter(filter: &Filter) -> Option<Predicate> {
    let Some(ty) = warnings::lookup(&filter.name) else {
        warn!("skipping ignore filter for unknown warning type {:?}", filter.name);
        return None;
    };
    let mut conditions = Vec::with_capacity(filter.expressions.len());
    for expression in &filter.expressions {
        match compile_condition(ty, expression.operator, expression.operands()) {
            Some(condition) => conditions.push(condition),
            None => {
                warn!(
                    "skipping ignore filter {:?}: cannot compile expression at {}",
                    filter.name, expression.start
                );
                return None;
            }
        }
    }
    Some(Box::new(move |warning: &Warning| {
        ty.matches(warning) && conditions.iter().all(|condition| condition.holds(warning))
    }))
}

fn compile_condition(ty: &WarningType, operator: ComparisonOperator, operands: Operands<'_>) -> Option<Condition> {
    let Operands::Comparison {
        name,
        literal,
        name_on_left,
    } = operands
    else {
        return None;
    };
    let (attribute, _) = ty.attribute(name)?;
    Some(Condition {
        attribute,
        operator,
        literal: literal.clone(),
        name_on_left,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::parser::parse;
    use crate::ignore::verifier::verify;
    use crate::position::Location;
    use crate::warnings::WarningKind;

    fn compile_source(source: &str) -> IgnoreFilter {
        let (filters, _) = verify(parse(source, "<test>").unwrap(), source);
        IgnoreFilter::compile(&filters)
    }

    fn warning(kind: WarningKind, line: usize) -> Warning {
        Warning::new(
            kind,
            "Print statement used.",
            "spam.py",
            Location::new(line, 0),
            Location::new(line, 10),
        )
    }

    #[test]
    fn test_allow_all() {
        let filter = IgnoreFilter::allow_all();
        assert!(filter.is_empty());
        assert!(filter.should_emit(&warning(WarningKind::LineTooLong, 1)));
    }

    #[test]
    fn test_bare_filter_suppresses_type() {
        let filter = compile_source("line-too-long");
        assert!(!filter.should_emit(&warning(WarningKind::LineTooLong, 1)));
        assert!(!filter.should_emit(&warning(WarningKind::LineTooLong, 200)));
        assert!(filter.should_emit(&warning(WarningKind::StarImport, 1)));
    }

    #[test]
    fn test_expression_narrows_filter() {
        let filter = compile_source("print-statement\n lineno = 1");
        assert!(!filter.should_emit(&warning(WarningKind::PrintStatement, 1)));
        assert!(filter.should_emit(&warning(WarningKind::PrintStatement, 2)));
    }

    #[test]
    fn test_expressions_are_conjoined() {
        let filter = compile_source("print-statement\n    lineno >= 3\n    lineno < 5\n");
        let emitted: Vec<_> = (1..=6)
            .filter(|&line| filter.should_emit(&warning(WarningKind::PrintStatement, line)))
            .collect();
        assert_eq!(emitted, vec![1, 2, 5, 6]);
    }

    #[test]
    fn test_filters_are_disjoined() {
        let filter = compile_source("star-import\n    lineno = 1\nstar-import\n    lineno = 3\n");
        assert_eq!(filter.len(), 2);
        assert!(!filter.should_emit(&warning(WarningKind::StarImport, 1)));
        assert!(filter.should_emit(&warning(WarningKind::StarImport, 2)));
        assert!(!filter.should_emit(&warning(WarningKind::StarImport, 3)));
    }

    #[test]
    fn test_literal_on_the_left() {
        let filter = compile_source("star-import\n    3 > lineno\n");
        assert!(!filter.should_emit(&warning(WarningKind::StarImport, 2)));
        assert!(filter.should_emit(&warning(WarningKind::StarImport, 3)));
    }

    #[test]
    fn test_string_attributes() {
        let filter = compile_source("print-statement\n    file = \"spam.py\"\n");
        assert!(!filter.should_emit(&warning(WarningKind::PrintStatement, 1)));
        let mut other = warning(WarningKind::PrintStatement, 1);
        other.file = "eggs.py".into();
        assert!(filter.should_emit(&other));
    }

    #[test]
    fn test_category_filter() {
        let filter = compile_source("python3-compatibility\n");
        assert!(!filter.should_emit(&warning(WarningKind::PrintStatement, 1)));
        assert!(!filter.should_emit(&warning(WarningKind::MixedTabsAndSpaces, 1)));
        assert!(filter.should_emit(&warning(WarningKind::StarImport, 1)));
        assert!(filter.should_emit(&warning(WarningKind::GlobalKeyword, 1)));
    }

    #[test]
    fn test_unverified_filters_are_skipped() {
        let filters = parse("bogus\nstar-import\n    foo = 1\n", "<test>").unwrap().filters;
        let filter = IgnoreFilter::compile(&filters);
        assert!(filter.is_empty());
    }
}
