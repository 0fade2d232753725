//! The four analysis passes
//!
//! | Pass  | Input                         | Warnings                                   |
//! |-------|-------------------------------|--------------------------------------------|
//! | line  | physical lines                | line-too-long                              |
//! | token | token stream                  | indentation width, mixed tabs and spaces   |
//! | cst   | bracket tree with whitespace  | extraneous whitespace                      |
//! | ast   | rustpython AST                | imports, except, global, print, division   |

pub mod ast;
pub mod base;
pub mod cst;
pub mod line;
pub mod token;

pub use ast::AstAnalyser;
pub use base::{Analyser, AnalyserBase, Dispatcher};
pub use cst::CstAnalyser;
pub use line::LineAnalyser;
pub use token::TokenAnalyser;

use crate::models::{AnalyserKind, Settings};
use crate::module::Module;
use crate::position::Location;
use crate::tokenizer::TokenizationError;
use crate::warnings::Warning;
use thiserror::Error;

/// A pass could not analyse a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("tokenization failed: {0}")]
    Tokenization(#[from] TokenizationError),
    #[error("syntax error: {message} ({location})")]
    Syntax { message: String, location: Location },
}

/// Runs one pass over `module`.
pub fn run_pass(kind: AnalyserKind, module: &Module, settings: &Settings) -> Result<Vec<Warning>, AnalysisError> {
    match kind {
        AnalyserKind::Line => run(LineAnalyser::new(module), module),
        AnalyserKind::Token => run(TokenAnalyser::new(module)?, module),
        AnalyserKind::Cst => run(CstAnalyser::new(module, settings.python_version)?, module),
        AnalyserKind::Ast => run(AstAnalyser::new(module, settings.python_version)?, module),
    }
}

fn run<A: Analyser>(analyser: A, module: &Module) -> Result<Vec<Warning>, AnalysisError> {
    log::debug!("running {} pass over {}", A::KIND, module.name());
    let warnings = analyser.analyse()?;
    log::debug!("{} pass over {}: {} warning(s)", A::KIND, module.name(), warnings.len());
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::WarningKind;

    #[test]
    fn test_analysers_report_their_pass() {
        assert_eq!(LineAnalyser::KIND, AnalyserKind::Line);
        assert_eq!(TokenAnalyser::KIND, AnalyserKind::Token);
        assert_eq!(CstAnalyser::KIND, AnalyserKind::Cst);
        assert_eq!(AstAnalyser::KIND, AnalyserKind::Ast);
    }

    #[test]
    fn test_run_pass_dispatches_on_kind() {
        let module = Module::new("spam.py", "if x:\n  y = [ 1]\n");
        let settings = Settings::default();
        let kinds = |kind| -> Vec<WarningKind> {
            run_pass(kind, &module, &settings)
                .unwrap()
                .into_iter()
                .map(|w| w.kind)
                .collect()
        };
        assert_eq!(kinds(AnalyserKind::Line), vec![]);
        assert_eq!(kinds(AnalyserKind::Token), vec![WarningKind::WrongNumberOfIndentationSpaces]);
        assert_eq!(kinds(AnalyserKind::Cst), vec![WarningKind::ExtraneousWhitespace]);
        assert_eq!(kinds(AnalyserKind::Ast), vec![]);
    }

    #[test]
    fn test_run_pass_reports_tokenization_failure() {
        let module = Module::new("spam.py", "x = 'abc\n");
        let error = run_pass(AnalyserKind::Token, &module, &Settings::default()).unwrap_err();
        match error {
            AnalysisError::Tokenization(error) => assert_eq!(error.location.line, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
