//! pyward CLI

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use pyward::config::{self, CliOverrides};
use pyward::formatters::{Formatter, JsonFormatter, TextFormatter};
use pyward::ignore::{self, VerificationWarning};
use pyward::logging::{LintLogEntry, LintLogger};
use pyward::models::{AnalyserKind, LintResult, PythonVersion};
use pyward::warnings::{self, Category, WarningKind};
use pyward::{collect_python_files, has_warnings, lint_files_parallel};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "pyward")]
#[command(version, about = "A multi-pass style and compatibility linter for Python source")]
struct Args {
    /// Files or directories to lint
    #[arg(default_value = ".")]
    paths: Vec<String>,

    /// Python version the code targets: py2 or py3
    #[arg(long)]
    target_version: Option<PythonVersion>,

    /// Passes to run (comma-separated: line, token, cst, ast)
    #[arg(long, value_delimiter = ',')]
    analysers: Vec<AnalyserKind>,

    /// Exclude paths matching patterns
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Suppression file (default: .pyward.ignore)
    #[arg(long)]
    ignore_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Do not print the source lines under each warning
    #[arg(long)]
    no_context: bool,

    /// Ignore pyproject.toml configuration
    #[arg(long)]
    no_config: bool,

    /// Append a JSON Lines record of this run to the given file
    #[arg(long)]
    log_file: Option<String>,

    /// List warning types and categories, then exit
    #[arg(long)]
    list_warnings: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init()
        .ok();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    if args.list_warnings {
        print_warning_types();
        return Ok(ExitCode::SUCCESS);
    }

    // Load config
    let config = if args.no_config {
        None
    } else {
        config::load_config(None)
    };

    // Merge CLI args with config
    let effective = config::merge_config(
        config.as_ref(),
        &CliOverrides {
            target_version: args.target_version,
            analysers: args.analysers.clone(),
            exclude: args.exclude.clone(),
            ignore_file: args.ignore_file.clone(),
        },
    );
    let settings = &effective.settings;
    log::debug!("target version: {}", settings.python_version);
    log::debug!("exclude patterns: {:?}", effective.exclude);

    let (filter, verification_warnings) = ignore::load_ignore_file(&effective.ignore_file)
        .with_context(|| format!("cannot load ignore file {}", effective.ignore_file.display()))?;
    print_verification_warnings(&verification_warnings);

    // Collect files
    let files = collect_python_files(&args.paths, &effective.exclude);
    log::debug!("found {} Python files", files.len());

    if files.is_empty() {
        eprintln!("No Python files found");
        return Ok(ExitCode::SUCCESS);
    }

    // Lint files
    let results = lint_files_parallel(&files, settings, &filter);

    if let Some(log_file) = &args.log_file {
        let mut logger = LintLogger::new(log_file)
            .with_context(|| format!("cannot open log file {}", log_file))?;
        logger
            .log(&LintLogEntry::from_results(&results, settings))
            .with_context(|| format!("cannot write log file {}", logger.log_path()))?;
    }

    print_errors(&results);

    let warnings: Vec<_> = results.iter().flat_map(|r| r.warnings.iter().cloned()).collect();
    match args.format {
        OutputFormat::Json => println!("{}", JsonFormatter.format_all(&warnings)),
        OutputFormat::Text => {
            let formatter = TextFormatter {
                color: true,
                show_context: !args.no_context,
            };
            for warning in &warnings {
                println!("{}", formatter.format(warning));
            }
            print_summary(&warnings, args.verbose);
        }
    }

    if has_warnings(&results) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_verification_warnings(warnings: &[VerificationWarning]) {
    for w in warnings {
        eprintln!("{} {}", "ignore:".yellow().bold(), w);
        for line in &w.lines {
            eprintln!("    {}", line.dimmed());
        }
    }
}

fn print_errors(results: &[LintResult]) {
    for result in results {
        for error in &result.errors {
            eprintln!("{}: {}", result.file_path.red(), error);
        }
    }
}

fn print_summary(warnings: &[warnings::Warning], verbose: bool) {
    if warnings.is_empty() {
        if verbose {
            eprintln!("\nNo issues found.");
        }
        return;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for w in warnings {
        *counts.entry(w.type_name()).or_insert(0) += 1;
    }
    let breakdown = counts
        .iter()
        .map(|(name, count)| format!("{} {}", count, name))
        .collect::<Vec<_>>()
        .join(", ");
    eprintln!("\nFound {} warning(s): {}", warnings.len(), breakdown);
}

fn print_warning_types() {
    for kind in WarningKind::ALL {
        println!(
            "{} {:<6} {}",
            format!("{:<36}", kind.type_name()).cyan().bold(),
            format!("{:?}", kind.granularity()).to_lowercase(),
            kind.description()
        );
    }
    println!();
    for category in Category::ALL {
        let members = category
            .members()
            .map(|kind| kind.type_name())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{} {}", format!("{:<36}", category.name()).cyan().bold(), members);
    }
    log::debug!("registered filter names: {:?}", warnings::registered_names());
}
