//! pyward: a multi-pass style and compatibility linter for Python source
//!
//! Each module is analysed by up to four independent passes (physical lines,
//! tokens, a whitespace preserving bracket tree and the AST). The resulting
//! warnings go through a user written suppression filter, see [`ignore`].

pub mod analysers;
pub mod config;
pub mod cst;
pub mod encoding;
pub mod formatters;
pub mod future;
pub mod ignore;
pub mod logging;
pub mod models;
pub mod module;
pub mod position;
pub mod tokenizer;
pub mod warnings;

use analysers::run_pass;
use ignore::IgnoreFilter;
use models::{LintError, LintResult, Settings};
use module::Module;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lint a single file and return the results
pub fn lint_file(file_path: &Path, settings: &Settings, filter: &IgnoreFilter) -> LintResult {
    let path_str = file_path.to_string_lossy().to_string();

    match Module::open(file_path) {
        Ok(module) => lint_module(&module, settings, filter),
        Err(e) => {
            log::warn!("{}: {}", path_str, e);
            LintResult::with_error(path_str, LintError::Decode(e))
        }
    }
}

/// Lint source code and return the results
pub fn lint_source(name: &str, source: &str, settings: &Settings, filter: &IgnoreFilter) -> LintResult {
    lint_module(&Module::new(name, source), settings, filter)
}

/// Runs every enabled pass over `module`, in pass order.
///
/// A failing pass is recorded in the result and does not stop the others.
pub fn lint_module(module: &Module, settings: &Settings, filter: &IgnoreFilter) -> LintResult {
    let mut result = LintResult::new(module.name().to_string());

    for pass in settings.passes() {
        match run_pass(pass, module, settings) {
            Ok(warnings) => result
                .warnings
                .extend(warnings.into_iter().filter(|w| filter.should_emit(w))),
            Err(source) => {
                log::warn!("{}: skipping {} pass: {}", module.name(), pass, source);
                result.errors.push(LintError::Analysis { pass, source });
            }
        }
    }

    result
}

/// Collect Python files from paths
pub fn collect_python_files(paths: &[String], exclude_patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        let p = Path::new(path);
        if p.is_file() {
            if is_python_file(p) {
                files.push(p.to_path_buf());
            }
        } else if p.is_dir() {
            for entry in WalkDir::new(p)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !should_exclude(e.path(), exclude_patterns))
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if path.is_file() && is_python_file(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            log::warn!("{}: no such file or directory", path);
        }
    }

    files
}

fn is_python_file(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "py")
}

/// A pattern excludes a path when it names one of its components, or, with a
/// leading `*`, when it is a suffix of the file name.
fn should_exclude(path: &Path, patterns: &[String]) -> bool {
    for pattern in patterns {
        if let Some(suffix) = pattern.strip_prefix('*') {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(suffix) {
                    return true;
                }
            }
            continue;
        }
        for component in path.components() {
            if let Some(comp_str) = component.as_os_str().to_str() {
                if comp_str == pattern {
                    return true;
                }
            }
        }
    }
    false
}

/// Lint multiple files in parallel, keeping the order of `files`
pub fn lint_files_parallel(files: &[PathBuf], settings: &Settings, filter: &IgnoreFilter) -> Vec<LintResult> {
    files
        .par_iter()
        .map(|file| lint_file(file, settings, filter))
        .collect()
}

/// Whether any warning survived suppression.
pub fn has_warnings(results: &[LintResult]) -> bool {
    results.iter().any(|result| !result.warnings.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalyserKind;
    use crate::warnings::WarningKind;
    use std::fs;
    use tempfile::TempDir;

    fn kinds(result: &LintResult) -> Vec<WarningKind> {
        result.warnings.iter().map(|w| w.kind).collect()
    }

    #[test]
    fn test_lint_source_runs_passes_in_order() {
        let source = format!("from os import *\nx = [ 1]\n# {}\n", "x".repeat(80));
        let result = lint_source("spam.py", &source, &Settings::default(), &IgnoreFilter::allow_all());
        assert!(result.errors.is_empty());
        assert_eq!(
            kinds(&result),
            vec![
                WarningKind::LineTooLong,
                WarningKind::ExtraneousWhitespace,
                WarningKind::StarImport,
            ]
        );
        assert!(result.warnings.iter().all(|w| w.file == "spam.py"));
    }

    #[test]
    fn test_selected_passes_only() {
        let settings = Settings {
            analysers: vec![AnalyserKind::Ast],
            ..Default::default()
        };
        let source = format!("from os import *\n# {}\n", "x".repeat(80));
        let result = lint_source("spam.py", &source, &settings, &IgnoreFilter::allow_all());
        assert_eq!(kinds(&result), vec![WarningKind::StarImport]);
    }

    #[test]
    fn test_failed_pass_does_not_stop_others() {
        let source = format!("x = = 1  # {}\n", "x".repeat(80));
        let result = lint_source("spam.py", &source, &Settings::default(), &IgnoreFilter::allow_all());
        assert_eq!(kinds(&result), vec![WarningKind::LineTooLong]);
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0],
            LintError::Analysis {
                pass: AnalyserKind::Ast,
                ..
            }
        ));
    }

    #[test]
    fn test_filter_is_applied() {
        let (filter, _) = ignore::load_ignore_source("star-import\n", "<test>").unwrap();
        let result = lint_source("spam.py", "from os import *\n", &Settings::default(), &filter);
        assert!(result.warnings.is_empty());
        assert!(!has_warnings(&[result]));
    }

    #[test]
    fn test_collect_python_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".venv/lib")).unwrap();
        fs::write(dir.path().join("pkg/a.py"), "").unwrap();
        fs::write(dir.path().join("pkg/b_test.py"), "").unwrap();
        fs::write(dir.path().join("pkg/notes.txt"), "").unwrap();
        fs::write(dir.path().join(".venv/lib/site.py"), "").unwrap();

        let root = dir.path().to_string_lossy().to_string();
        let files = collect_python_files(&[root.clone()], &[".venv".to_string()]);
        assert_eq!(files, vec![dir.path().join("pkg/a.py"), dir.path().join("pkg/b_test.py")]);

        let files = collect_python_files(&[root], &[".venv".to_string(), "*_test.py".to_string()]);
        assert_eq!(files, vec![dir.path().join("pkg/a.py")]);
    }

    #[test]
    fn test_lint_files_parallel_keeps_order() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for i in 0..8 {
            let path = dir.path().join(format!("m{i}.py"));
            fs::write(&path, "from os import *\n".repeat(i)).unwrap();
            files.push(path);
        }
        let results = lint_files_parallel(&files, &Settings::default(), &IgnoreFilter::allow_all());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.file_path, files[i].to_string_lossy());
            assert_eq!(result.warnings.len(), i);
        }
    }

    #[test]
    fn test_undecodable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.py");
        fs::write(&path, b"# -*- coding: klingon -*-\nx = 1\n").unwrap();
        let result = lint_file(&path, &Settings::default(), &IgnoreFilter::allow_all());
        assert!(result.warnings.is_empty());
        assert!(matches!(result.errors[0], LintError::Decode(_)));
    }
}
