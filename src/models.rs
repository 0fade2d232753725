//! Core data models for pyward

use crate::analysers::AnalysisError;
use crate::encoding::DecodeError;
use crate::warnings::Warning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Python language level the analysed code targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PythonVersion {
    #[serde(rename = "py2")]
    Python2,
    #[default]
    #[serde(rename = "py3")]
    Python3,
}

impl FromStr for PythonVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "py2" | "2" => Ok(PythonVersion::Python2),
            "py3" | "3" => Ok(PythonVersion::Python3),
            other => Err(format!("unknown target version {other:?} (expected py2 or py3)")),
        }
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PythonVersion::Python2 => write!(f, "py2"),
            PythonVersion::Python3 => write!(f, "py3"),
        }
    }
}

/// One analysis pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyserKind {
    Line,
    Token,
    Cst,
    Ast,
}

impl AnalyserKind {
    /// Passes in the order they run over a module
    pub const ALL: [AnalyserKind; 4] = [
        AnalyserKind::Line,
        AnalyserKind::Token,
        AnalyserKind::Cst,
        AnalyserKind::Ast,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnalyserKind::Line => "line",
            AnalyserKind::Token => "token",
            AnalyserKind::Cst => "cst",
            AnalyserKind::Ast => "ast",
        }
    }
}

impl FromStr for AnalyserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalyserKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown analyser {s:?} (expected line, token, cst or ast)"))
    }
}

impl fmt::Display for AnalyserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Effective settings handed to the analysers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub python_version: PythonVersion,
    pub analysers: Vec<AnalyserKind>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            python_version: PythonVersion::default(),
            analysers: AnalyserKind::ALL.to_vec(),
        }
    }
}

impl Settings {
    /// Enabled passes, deduplicated, in run order
    pub fn passes(&self) -> impl Iterator<Item = AnalyserKind> + '_ {
        AnalyserKind::ALL
            .into_iter()
            .filter(|kind| self.analysers.contains(kind))
    }
}

/// A failure that stopped (part of) the analysis of one file
#[derive(Debug, Error)]
pub enum LintError {
    #[error("failed to read source: {0}")]
    Decode(#[from] DecodeError),
    #[error("{pass} analysis failed: {source}")]
    Analysis {
        pass: AnalyserKind,
        #[source]
        source: AnalysisError,
    },
}

/// Result of linting a single file
#[derive(Debug, Default)]
pub struct LintResult {
    pub file_path: String,
    pub warnings: Vec<Warning>,
    pub errors: Vec<LintError>,
}

impl LintResult {
    pub fn new(file_path: String) -> Self {
        Self {
            file_path,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_error(file_path: String, error: LintError) -> Self {
        Self {
            file_path,
            warnings: Vec::new(),
            errors: vec![error],
        }
    }
}
