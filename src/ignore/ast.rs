//! Syntax tree of an ignore file

use crate::position::Location;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreFile {
    pub filename: String,
    pub filters: Vec<Filter>,
}

/// A warning type or category name, optionally narrowed by expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub expressions: Vec<Expression>,
    pub start: Location,
    pub end: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    LessThan,
    GreaterThan,
    LessOrEqualThan,
    GreaterOrEqualThan,
}

impl ComparisonOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Equal),
            "<" => Some(Self::LessThan),
            ">" => Some(Self::GreaterThan),
            "<=" => Some(Self::LessOrEqualThan),
            ">=" => Some(Self::GreaterOrEqualThan),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessOrEqualThan => "<=",
            Self::GreaterOrEqualThan => ">=",
        }
    }

    /// Name used in verification messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::LessThan => "less than",
            Self::GreaterThan => "greater than",
            Self::LessOrEqualThan => "less or equal than",
            Self::GreaterOrEqualThan => "greater or equal than",
        }
    }

    /// Whether `left <op> right` holds, given how `left` orders against `right`.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::Equal => ordering == Ordering::Equal,
            Self::LessThan => ordering == Ordering::Less,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::LessOrEqualThan => ordering != Ordering::Greater,
            Self::GreaterOrEqualThan => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    String(String),
    Integer(u64),
}

impl LiteralValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::String(_) => "string",
            LiteralValue::Integer(_) => "integer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandKind {
    /// Reference to a warning attribute
    Name(String),
    Literal(LiteralValue),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub kind: OperandKind,
    pub start: Location,
    pub end: Location,
}

impl Operand {
    pub fn name(name: impl Into<String>, start: Location, end: Location) -> Self {
        Self {
            kind: OperandKind::Name(name.into()),
            start,
            end,
        }
    }

    pub fn literal(value: LiteralValue, start: Location, end: Location) -> Self {
        Self {
            kind: OperandKind::Literal(value),
            start,
            end,
        }
    }
}

/// Shape of an expression with respect to its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands<'e> {
    /// An attribute compared against a literal; `name_on_left` records which
    /// side the attribute was written on.
    Comparison {
        name: &'e str,
        literal: &'e LiteralValue,
        name_on_left: bool,
    },
    BothNames,
    BothLiterals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub operator: ComparisonOperator,
    pub left: Operand,
    pub right: Operand,
    pub start: Location,
    pub end: Location,
}

impl Expression {
    pub fn operands(&self) -> Operands<'_> {
        match (&self.left.kind, &self.right.kind) {
            (OperandKind::Name(name), OperandKind::Literal(literal)) => Operands::Comparison {
                name,
                literal,
                name_on_left: true,
            },
            (OperandKind::Literal(literal), OperandKind::Name(name)) => Operands::Comparison {
                name,
                literal,
                name_on_left: false,
            },
            (OperandKind::Name(_), OperandKind::Name(_)) => Operands::BothNames,
            (OperandKind::Literal(_), OperandKind::Literal(_)) => Operands::BothLiterals,
        }
    }
}
