//! Checks on raw physical lines

use super::base::Analyser;
use crate::models::AnalyserKind;
use crate::module::Module;
use crate::position::Location;
use crate::warnings::{Warning, WarningKind};

pub const MAX_LINE_LENGTH: usize = 79;

const LINE_TOO_LONG: &str = "Line is longer than 79 characters. You should keep it below that";

pub struct LineAnalyser<'m> {
    module: &'m Module,
    warnings: Vec<Warning>,
}

impl<'m> LineAnalyser<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            warnings: Vec::new(),
        }
    }
}

impl Analyser for LineAnalyser<'_> {
    const KIND: AnalyserKind = AnalyserKind::Line;

    fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    fn analyse(mut self) -> Result<Vec<Warning>, super::AnalysisError> {
        for (index, line) in self.module.source().lines().enumerate() {
            if line.trim_end().chars().count() > MAX_LINE_LENGTH {
                let lineno = index + 1;
                let warning = Warning::new(
                    WarningKind::LineTooLong,
                    LINE_TOO_LONG,
                    self.module.name(),
                    Location::new(lineno, 0),
                    Location::new(lineno, line.chars().count()),
                )
                .with_lines(vec![line.trim_end().to_string()]);
                self.warnings.push(warning);
            }
        }
        Ok(self.into_warnings())
    }
}
