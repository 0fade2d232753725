//! Run log for pyward
//!
//! Appends one JSON Lines record per lint run to a file, for later analysis
//! and statistics.

use crate::models::{LintResult, Settings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// A single log entry representing one lint run
#[derive(Debug, Serialize, Deserialize)]
pub struct LintLogEntry {
    /// Unix timestamp of when the lint was run
    pub timestamp: i64,
    /// ISO 8601 formatted date string
    pub datetime: String,
    /// Total number of files scanned
    pub files_scanned: usize,
    /// Files on which at least one pass failed
    pub files_with_errors: usize,
    /// Warnings left after suppression
    pub total_warnings: usize,
    /// Surviving warnings per warning type
    pub warning_counts: BTreeMap<String, usize>,
    pub warnings: Vec<WarningLogEntry>,
    pub target_version: String,
    pub analysers: Vec<String>,
}

/// Log entry for a single warning
#[derive(Debug, Serialize, Deserialize)]
pub struct WarningLogEntry {
    /// Warning type (e.g., line-too-long)
    pub warning_type: String,
    pub file_path: String,
    pub line: usize,
    pub message: String,
    /// First source line of the warning (truncated if too long)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
}

impl LintLogEntry {
    /// Create a new log entry from lint results
    pub fn from_results(results: &[LintResult], settings: &Settings) -> Self {
        let now = chrono::Utc::now();

        let mut warnings = Vec::new();
        let mut warning_counts = BTreeMap::new();

        for result in results {
            for w in &result.warnings {
                *warning_counts.entry(w.type_name().to_string()).or_insert(0) += 1;
                warnings.push(WarningLogEntry {
                    warning_type: w.type_name().to_string(),
                    file_path: w.file.clone(),
                    line: w.lineno(),
                    message: w.message.clone(),
                    source_line: w
                        .lines
                        .first()
                        .map(|line| line.trim())
                        .filter(|line| !line.is_empty())
                        .map(|line| truncate_source_line(line, 200)),
                });
            }
        }

        Self {
            timestamp: now.timestamp(),
            datetime: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            files_scanned: results.len(),
            files_with_errors: results.iter().filter(|r| !r.errors.is_empty()).count(),
            total_warnings: warnings.len(),
            warning_counts,
            warnings,
            target_version: settings.python_version.to_string(),
            analysers: settings.passes().map(|kind| kind.to_string()).collect(),
        }
    }
}

/// Logger that writes lint results to a file
pub struct LintLogger {
    writer: BufWriter<File>,
    log_path: String,
}

impl LintLogger {
    /// Create a new logger that writes to the specified file
    /// If the file exists, it will be appended to; otherwise created
    pub fn new(log_path: &str) -> std::io::Result<Self> {
        let path = Path::new(log_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            log_path: log_path.to_string(),
        })
    }

    /// Log a lint run to the file
    pub fn log(&mut self, entry: &LintLogEntry) -> std::io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }

    pub fn log_path(&self) -> &str {
        &self.log_path
    }
}

/// Truncate source line if too long
fn truncate_source_line(line: &str, max_chars: usize) -> String {
    match line.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &line[..index]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Location;
    use crate::warnings::{Warning, WarningKind};
    use tempfile::TempDir;

    fn result_with_warnings() -> LintResult {
        let mut result = LintResult::new("test.py".to_string());
        result.warnings = vec![
            Warning::new(
                WarningKind::StarImport,
                "Star imports are not allowed.",
                "test.py",
                Location::new(1, 0),
                Location::new(1, 17),
            )
            .with_lines(vec!["from os import *".to_string()]),
            Warning::new(
                WarningKind::StarImport,
                "Star imports are not allowed.",
                "test.py",
                Location::new(2, 0),
                Location::new(2, 18),
            ),
            Warning::new(
                WarningKind::LineTooLong,
                "Line is longer than 79 characters. You should keep it below that",
                "test.py",
                Location::new(3, 0),
                Location::new(3, 90),
            ),
        ];
        result
    }

    #[test]
    fn test_lint_log_entry_creation() {
        let entry = LintLogEntry::from_results(&[result_with_warnings()], &Settings::default());

        assert_eq!(entry.files_scanned, 1);
        assert_eq!(entry.files_with_errors, 0);
        assert_eq!(entry.total_warnings, 3);
        assert_eq!(entry.warning_counts["star-import"], 2);
        assert_eq!(entry.warning_counts["line-too-long"], 1);
        assert_eq!(entry.warnings[0].source_line.as_deref(), Some("from os import *"));
        assert_eq!(entry.warnings[1].source_line, None);
        assert_eq!(entry.target_version, "py3");
        assert_eq!(entry.analysers, vec!["line", "token", "cst", "ast"]);
    }

    #[test]
    fn test_logger_creation_and_write() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("logs").join("lint.jsonl");
        let log_path_str = log_path.to_string_lossy().to_string();

        let mut logger = LintLogger::new(&log_path_str).unwrap();
        assert_eq!(logger.log_path(), log_path_str);

        let entry = LintLogEntry::from_results(&[], &Settings::default());
        logger.log(&entry).unwrap();
        logger.log(&entry).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: LintLogEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.files_scanned, 0);
        assert_eq!(parsed.total_warnings, 0);
    }

    #[test]
    fn test_truncate_source_line() {
        let short = "short line";
        assert_eq!(truncate_source_line(short, 100), "short line");

        let long = "a".repeat(250);
        let truncated = truncate_source_line(&long, 200);
        assert_eq!(truncated.len(), 203); // 200 chars + "..."
        assert!(truncated.ends_with("..."));
    }
}
