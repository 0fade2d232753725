//! Warning kinds, categories and the attribute schemas ignore filters are
//! checked against.

use crate::position::Location;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// The pass a warning kind is produced by. Decides its attribute schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Line,
    Token,
    Cst,
    Ast,
}

/// Cross-cutting grouping of warning kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Pep8,
    Python3Compatibility,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Pep8, Category::Python3Compatibility];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Pep8 => "pep8",
            Category::Python3Compatibility => "python3-compatibility",
        }
    }

    pub fn members(&self) -> impl Iterator<Item = WarningKind> + '_ {
        WarningKind::ALL
            .into_iter()
            .filter(move |kind| kind.categories().contains(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    LineTooLong,
    WrongNumberOfIndentationSpaces,
    MixedTabsAndSpaces,
    ExtraneousWhitespace,
    MultipleImports,
    StarImport,
    IndiscriminateExcept,
    GlobalKeyword,
    PrintStatement,
    DivStatement,
}

impl WarningKind {
    pub const ALL: [WarningKind; 10] = [
        WarningKind::LineTooLong,
        WarningKind::WrongNumberOfIndentationSpaces,
        WarningKind::MixedTabsAndSpaces,
        WarningKind::ExtraneousWhitespace,
        WarningKind::MultipleImports,
        WarningKind::StarImport,
        WarningKind::IndiscriminateExcept,
        WarningKind::GlobalKeyword,
        WarningKind::PrintStatement,
        WarningKind::DivStatement,
    ];

    /// Stable machine name, used by ignore filters and output.
    pub fn type_name(&self) -> &'static str {
        match self {
            WarningKind::LineTooLong => "line-too-long",
            WarningKind::WrongNumberOfIndentationSpaces => "wrong-number-of-indentation-spaces",
            WarningKind::MixedTabsAndSpaces => "mixed-tabs-and-spaces",
            WarningKind::ExtraneousWhitespace => "extraneous-whitespace",
            WarningKind::MultipleImports => "multiple-imports",
            WarningKind::StarImport => "star-import",
            WarningKind::IndiscriminateExcept => "indiscriminate-except",
            WarningKind::GlobalKeyword => "global-keyword",
            WarningKind::PrintStatement => "print-statement",
            WarningKind::DivStatement => "div-statement",
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            WarningKind::LineTooLong => Granularity::Line,
            WarningKind::WrongNumberOfIndentationSpaces | WarningKind::MixedTabsAndSpaces => {
                Granularity::Token
            }
            WarningKind::ExtraneousWhitespace => Granularity::Cst,
            WarningKind::MultipleImports
            | WarningKind::StarImport
            | WarningKind::IndiscriminateExcept
            | WarningKind::GlobalKeyword
            | WarningKind::PrintStatement
            | WarningKind::DivStatement => Granularity::Ast,
        }
    }

    pub fn categories(&self) -> &'static [Category] {
        match self {
            WarningKind::MixedTabsAndSpaces => &[Category::Pep8, Category::Python3Compatibility],
            WarningKind::PrintStatement | WarningKind::DivStatement => {
                &[Category::Python3Compatibility]
            }
            WarningKind::GlobalKeyword => &[],
            _ => &[Category::Pep8],
        }
    }

    pub fn attributes(&self) -> &'static [(Attribute, AttributeType)] {
        match self.granularity() {
            Granularity::Line => LINE_ATTRIBUTES,
            Granularity::Token | Granularity::Cst | Granularity::Ast => SPAN_ATTRIBUTES,
        }
    }

    /// One-line explanation shown by `--list-warnings`.
    pub fn description(&self) -> &'static str {
        match self {
            WarningKind::LineTooLong => "Physical line longer than 79 characters",
            WarningKind::WrongNumberOfIndentationSpaces => "Indentation step other than 4 spaces",
            WarningKind::MixedTabsAndSpaces => "Tabs and spaces mixed in the leading whitespace of a statement",
            WarningKind::ExtraneousWhitespace => "Whitespace inside brackets or before separators",
            WarningKind::MultipleImports => "Several modules imported by one import statement",
            WarningKind::StarImport => "Wildcard import",
            WarningKind::IndiscriminateExcept => "Bare except clause as the only handler",
            WarningKind::GlobalKeyword => "Use of the global statement",
            WarningKind::PrintStatement => "Python 2 print statement",
            WarningKind::DivStatement => "/ with floor division semantics on Python 2",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A warning field an ignore expression may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Message,
    File,
    Lineno,
    Start,
    End,
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Message => "message",
            Attribute::File => "file",
            Attribute::Lineno => "lineno",
            Attribute::Start => "start",
            Attribute::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    String,
    Integer,
    Location,
}

impl AttributeType {
    pub fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Integer => "integer",
            AttributeType::Location => "location",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue<'w> {
    String(&'w str),
    Integer(u64),
    Location(Location),
}

const LINE_ATTRIBUTES: &[(Attribute, AttributeType)] = &[
    (Attribute::Message, AttributeType::String),
    (Attribute::File, AttributeType::String),
    (Attribute::Lineno, AttributeType::Integer),
];

const SPAN_ATTRIBUTES: &[(Attribute, AttributeType)] = &[
    (Attribute::Message, AttributeType::String),
    (Attribute::File, AttributeType::String),
    (Attribute::Lineno, AttributeType::Integer),
    (Attribute::Start, AttributeType::Location),
    (Attribute::End, AttributeType::Location),
];

/// One detected issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub file: String,
    pub start: Location,
    pub end: Location,
    /// Logical lines covered by `start..=end`, for display only
    pub lines: Vec<String>,
}

impl Warning {
    pub fn new(
        kind: WarningKind,
        message: impl Into<String>,
        file: impl Into<String>,
        start: Location,
        end: Location,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            file: file.into(),
            start,
            end,
            lines: Vec::new(),
        }
    }

    pub fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }

    pub fn lineno(&self) -> usize {
        self.start.line
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Whether this warning's kind exposes spans to ignore filters and
    /// formatters.
    pub fn has_span(&self) -> bool {
        self.kind.granularity() != Granularity::Line
    }

    pub fn attribute(&self, attribute: Attribute) -> AttributeValue<'_> {
        match attribute {
            Attribute::Message => AttributeValue::String(&self.message),
            Attribute::File => AttributeValue::String(&self.file),
            Attribute::Lineno => AttributeValue::Integer(self.lineno() as u64),
            Attribute::Start => AttributeValue::Location(self.start),
            Attribute::End => AttributeValue::Location(self.end),
        }
    }
}

/// What an ignore filter name selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    Kind(WarningKind),
    Category(Category),
}

/// Registry entry: a name ignore filters may use and the attributes it
/// exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningType {
    pub name: &'static str,
    pub target: FilterTarget,
    pub attributes: &'static [(Attribute, AttributeType)],
}

impl WarningType {
    pub fn matches(&self, warning: &Warning) -> bool {
        match self.target {
            FilterTarget::Kind(kind) => warning.kind == kind,
            FilterTarget::Category(category) => warning.kind.categories().contains(&category),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<(Attribute, AttributeType)> {
        self.attributes
            .iter()
            .copied()
            .find(|(attribute, _)| attribute.name() == name)
    }
}

static REGISTRY: Lazy<HashMap<&'static str, WarningType>> = Lazy::new(|| {
    let kinds = WarningKind::ALL.into_iter().map(|kind| WarningType {
        name: kind.type_name(),
        target: FilterTarget::Kind(kind),
        attributes: kind.attributes(),
    });
    let categories = Category::ALL.into_iter().map(|category| WarningType {
        name: category.name(),
        target: FilterTarget::Category(category),
        attributes: LINE_ATTRIBUTES,
    });
    kinds.chain(categories).map(|ty| (ty.name, ty)).collect()
});

/// Looks up a warning kind or category by its filter name.
pub fn lookup(name: &str) -> Option<&'static WarningType> {
    REGISTRY.get(name)
}

/// All registered filter names, sorted.
pub fn registered_names() -> Vec<&'static str> {
    let mut names: Vec<_> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_is_registered() {
        for kind in WarningKind::ALL {
            let ty = lookup(kind.type_name()).unwrap();
            assert_eq!(ty.target, FilterTarget::Kind(kind));
        }
        assert_eq!(registered_names().len(), 12);
    }

    #[test]
    fn test_line_warning_schema_has_no_span() {
        let ty = lookup("line-too-long").unwrap();
        assert!(ty.attribute("lineno").is_some());
        assert!(ty.attribute("start").is_none());
    }

    #[test]
    fn test_span_schema() {
        let ty = lookup("multiple-imports").unwrap();
        assert_eq!(
            ty.attribute("start"),
            Some((Attribute::Start, AttributeType::Location))
        );
        assert_eq!(
            ty.attribute("message"),
            Some((Attribute::Message, AttributeType::String))
        );
    }

    #[test]
    fn test_category_membership() {
        let members: Vec<_> = Category::Python3Compatibility.members().collect();
        assert_eq!(
            members,
            vec![
                WarningKind::MixedTabsAndSpaces,
                WarningKind::PrintStatement,
                WarningKind::DivStatement
            ]
        );
        let ty = lookup("pep8").unwrap();
        let warning = Warning::new(
            WarningKind::StarImport,
            "m",
            "f.py",
            Location::new(1, 0),
            Location::new(1, 5),
        );
        assert!(ty.matches(&warning));
        let print = Warning { kind: WarningKind::PrintStatement, ..warning };
        assert!(!ty.matches(&print));
    }

    #[test]
    fn test_attribute_values() {
        let warning = Warning::new(
            WarningKind::GlobalKeyword,
            "The global keyword should be avoided.",
            "mod.py",
            Location::new(3, 4),
            Location::new(3, 12),
        );
        assert_eq!(warning.attribute(Attribute::Lineno), AttributeValue::Integer(3));
        assert_eq!(warning.attribute(Attribute::File), AttributeValue::String("mod.py"));
        assert_eq!(
            warning.attribute(Attribute::End),
            AttributeValue::Location(Location::new(3, 12))
        );
    }
}
