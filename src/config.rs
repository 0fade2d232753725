//! Configuration loading for pyward
//!
//! Loads configuration from pyproject.toml [tool.pyward] section

use crate::ignore::DEFAULT_IGNORE_FILE;
use crate::models::{AnalyserKind, PythonVersion, Settings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const TOOL_SECTION: &str = "pyward";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Python version the code targets (py2 or py3)
    #[serde(default)]
    pub target_version: Option<PythonVersion>,

    /// Passes to run (empty means all passes)
    #[serde(default)]
    pub analysers: Vec<AnalyserKind>,

    /// Paths to exclude from linting
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Suppression file, relative to the working directory
    #[serde(default)]
    pub ignore_file: Option<PathBuf>,
}

/// Command line overrides; empty or `None` fields fall back to the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub target_version: Option<PythonVersion>,
    pub analysers: Vec<AnalyserKind>,
    pub exclude: Vec<String>,
    pub ignore_file: Option<PathBuf>,
}

/// Configuration after merging the file, the command line and the defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub settings: Settings,
    pub exclude: Vec<String>,
    pub ignore_file: PathBuf,
}

/// Find pyproject.toml with [tool.pyward] section
pub fn find_config_pyproject_toml(start_path: &Path) -> Option<PathBuf> {
    let mut current = if start_path.is_file() {
        start_path.parent()?
    } else {
        start_path
    };

    loop {
        let pyproject = current.join("pyproject.toml");
        if pyproject.exists() {
            if let Ok(content) = std::fs::read_to_string(&pyproject) {
                if let Ok(value) = toml::from_str::<toml::Value>(&content) {
                    if let Some(tool) = value.get("tool") {
                        if tool.get(TOOL_SECTION).is_some() {
                            return Some(pyproject);
                        }
                    }
                }
            }
        }

        current = current.parent()?;
    }
}

/// Load configuration from pyproject.toml
pub fn load_config(path: Option<&Path>) -> Option<Config> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            p.to_path_buf()
        } else {
            return None;
        }
    } else {
        find_config_pyproject_toml(&std::env::current_dir().ok()?)?
    };

    let content = std::fs::read_to_string(&config_path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;

    let tool = value.get("tool")?;
    let section = tool.get(TOOL_SECTION)?;

    let parsed: Result<Config, _> = section.clone().try_into();
    match parsed {
        Ok(config) => {
            log::debug!("loaded configuration from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("ignoring invalid [tool.pyward] in {}: {}", config_path.display(), e);
            None
        }
    }
}

/// Merge command line arguments with config file settings
/// CLI arguments take precedence
pub fn merge_config(config: Option<&Config>, cli: &CliOverrides) -> EffectiveConfig {
    let mut python_version = PythonVersion::default();
    let mut analysers = Vec::new();
    let mut exclude = vec![];
    let mut ignore_file = PathBuf::from(DEFAULT_IGNORE_FILE);

    // Start with config file settings
    if let Some(cfg) = config {
        if let Some(version) = cfg.target_version {
            python_version = version;
        }
        analysers = cfg.analysers.clone();
        if let Some(path) = &cfg.ignore_file {
            ignore_file = path.clone();
        }
        exclude.extend(cfg.exclude.iter().cloned());
    }

    // Apply CLI overrides
    if let Some(version) = cli.target_version {
        python_version = version;
    }
    if !cli.analysers.is_empty() {
        analysers = cli.analysers.clone();
    }
    if let Some(path) = &cli.ignore_file {
        ignore_file = path.clone();
    }
    exclude.extend(cli.exclude.iter().cloned());

    if analysers.is_empty() {
        analysers = AnalyserKind::ALL.to_vec();
    }

    // Add default excludes
    let defaults = [
        ".venv",
        "venv",
        "__pycache__",
        ".git",
        ".tox",
        "build",
        "dist",
        ".pytest_cache",
        ".ruff_cache",
        "node_modules",
        ".mypy_cache",
    ];
    for default in defaults {
        if !exclude.iter().any(|e| e == default) {
            exclude.push(default.to_string());
        }
    }

    EffectiveConfig {
        settings: Settings {
            python_version,
            analysers,
        },
        exclude,
        ignore_file,
    }
}
