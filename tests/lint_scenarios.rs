use pyward::ignore::{load_ignore_file, load_ignore_source, IgnoreFilter};
use pyward::models::{AnalyserKind, PythonVersion, Settings};
use pyward::position::Location;
use pyward::warnings::{Warning, WarningKind};
use pyward::{has_warnings, lint_source};
use std::fs;
use tempfile::TempDir;

fn only(pass: AnalyserKind) -> Settings {
    Settings {
        analysers: vec![pass],
        ..Default::default()
    }
}

fn lint(source: &str, settings: &Settings) -> Vec<Warning> {
    let result = lint_source("scenario.py", source, settings, &IgnoreFilter::allow_all());
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    result.warnings
}

fn warning(kind: WarningKind, line: usize) -> Warning {
    Warning::new(
        kind,
        "message",
        "scenario.py",
        Location::new(line, 0),
        Location::new(line, 4),
    )
}

#[test]
fn multiple_imports_in_one_statement() {
    let warnings = lint("import foo, bar\n", &only(AnalyserKind::Ast));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::MultipleImports);
    assert_eq!(warnings[0].lineno(), 1);
}

#[test]
fn two_space_indentation() {
    let warnings = lint("def foo():\n  pass\n", &only(AnalyserKind::Token));
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
fn whitespace_at_the_beginning_of_a_list() {
    let warnings = lint("[ 1, 2]", &only(AnalyserKind::Cst));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::ExtraneousWhitespace);
    assert_eq!(warnings[0].lineno(), 1);
    assert_eq!(
        warnings[0].message,
        "Extraneous whitespace at the beginning of a list."
    );
}

#[test]
fn bare_filter_suppresses_every_warning_of_its_type() {
    let (filter, verification) = load_ignore_source("line-too-long", "<test>").unwrap();
    assert!(verification.is_empty());
    for line in [1, 7, 120] {
        assert!(!filter.should_emit(&warning(WarningKind::LineTooLong, line)));
    }
    assert!(filter.should_emit(&warning(WarningKind::StarImport, 1)));
}

#[test]
fn filter_expression_on_lineno() {
    let (filter, verification) = load_ignore_source("print-statement\n lineno = 1", "<test>").unwrap();
    assert!(verification.is_empty());
    assert!(!filter.should_emit(&warning(WarningKind::PrintStatement, 1)));
    assert!(filter.should_emit(&warning(WarningKind::PrintStatement, 2)));
}

#[test]
fn unknown_filter_name() {
    let (filter, verification) = load_ignore_source("bogus-type", "<test>").unwrap();
    assert!(filter.is_empty());
    assert_eq!(verification.len(), 1);
    assert!(filter.should_emit(&warning(WarningKind::LineTooLong, 1)));
}

#[test]
fn empty_ignore_file_suppresses_nothing() {
    let (filter, verification) = load_ignore_source("", "<test>").unwrap();
    assert!(filter.is_empty());
    assert!(verification.is_empty());
    for kind in WarningKind::ALL {
        assert!(filter.should_emit(&warning(kind, 1)));
    }
}

#[test]
fn python2_print_statements_end_to_end() {
    let settings = Settings {
        python_version: PythonVersion::Python2,
        ..Default::default()
    };
    let source = "print 'a'\nprint 'b'\n";

    let warnings = lint(source, &settings);
    let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::PrintStatement, WarningKind::PrintStatement]);

    let (filter, _) = load_ignore_source("print-statement\n    lineno = 1\n", "<test>").unwrap();
    let result = lint_source("scenario.py", source, &settings, &filter);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].lineno(), 2);
    assert!(has_warnings(&[result]));
}

#[test]
fn category_filter_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".pyward.ignore");
    fs::write(&path, "# legacy code base\npython3-compatibility\n").unwrap();
    let (filter, verification) = load_ignore_file(&path).unwrap();
    assert!(verification.is_empty());

    let settings = Settings {
        python_version: PythonVersion::Python2,
        ..Default::default()
    };
    let result = lint_source("scenario.py", "x = 1 / 2\nprint x\nfrom os import *\n", &settings, &filter);
    let kinds: Vec<_> = result.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::StarImport]);
}

#[test]
fn clean_module_has_no_warnings() {
    let source = "import os\n\n\ndef main():\n    return os.getcwd()\n";
    let result = lint_source("clean.py", source, &Settings::default(), &IgnoreFilter::allow_all());
    assert!(result.errors.is_empty());
    assert!(!has_warnings(&[result]));
}
