//! Suppression files
//!
//! An ignore file lists warning types (or categories) to drop from the
//! output, each optionally narrowed by attribute comparisons:
//!
//! ```text
//! # long lines are fine in generated code
//! line-too-long
//!     file = "generated.py"
//! print-statement
//!     lineno <= 10
//! ```
//!
//! Loading runs the lexer, parser, verifier and compiler in turn.

pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod tokens;
pub mod verifier;

pub use compiler::IgnoreFilter;
pub use lexer::LexingError;
pub use parser::ParsingError;
pub use verifier::VerificationWarning;

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when none is configured.
pub const DEFAULT_IGNORE_FILE: &str = ".pyward.ignore";

#[derive(Debug, Error)]
pub enum IgnoreError {
    #[error("{0}")]
    Lexing(#[from] LexingError),
    #[error("{0}")]
    Parsing(#[from] ParsingError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Compiles ignore file text into a filter.
pub fn load_ignore_source(
    source: &str,
    filename: &str,
) -> Result<(IgnoreFilter, Vec<VerificationWarning>), IgnoreError> {
    let file = parser::parse(source, filename)?;
    let (filters, warnings) = verifier::verify(file, source);
    log::debug!("{filename}: {} usable ignore filters", filters.len());
    Ok((IgnoreFilter::compile(&filters), warnings))
}

/// Loads the ignore file at `path`. A missing file suppresses nothing.
pub fn load_ignore_file(path: &Path) -> Result<(IgnoreFilter, Vec<VerificationWarning>), IgnoreError> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            log::debug!("no ignore file at {}", path.display());
            return Ok((IgnoreFilter::allow_all(), Vec::new()));
        }
        Err(source) => {
            return Err(IgnoreError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };
    load_ignore_source(&source, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_allows_everything() {
        let dir = tempdir().unwrap();
        let (filter, warnings) = load_ignore_file(&dir.path().join(DEFAULT_IGNORE_FILE)).unwrap();
        assert!(filter.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_IGNORE_FILE);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "line-too-long").unwrap();
        writeln!(file, "unknown-thing").unwrap();

        let (filter, warnings) = load_ignore_file(&path).unwrap();
        assert_eq!(filter.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].file, path.display().to_string());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(matches!(
            load_ignore_source("line-too-long\n    lineno ==\n", "<test>"),
            Err(IgnoreError::Parsing(_))
        ));
        assert!(matches!(
            load_ignore_source("line-too-long\n    lineno ~ 1\n", "<test>"),
            Err(IgnoreError::Lexing(_))
        ));
    }
}
