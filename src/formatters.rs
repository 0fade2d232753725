//! Rendering warnings for humans and machines

use crate::position::Location;
use crate::warnings::Warning;
use colored::*;
use serde_json::{json, Value};

pub trait Formatter {
    fn format(&self, warning: &Warning) -> String;

    fn format_all(&self, warnings: &[Warning]) -> String {
        warnings
            .iter()
            .map(|warning| self.format(warning))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `file:line:column: type message`, followed by the source lines the
/// warning covers.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatter {
    pub color: bool,
    pub show_context: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            color: true,
            show_context: true,
        }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, warning: &Warning) -> String {
        let location = format!(
            "{}:{}:{}:",
            warning.file, warning.start.line, warning.start.column
        );
        let mut out = if self.color {
            format!(
                "{} {} {}",
                location.bold(),
                warning.type_name().yellow(),
                warning.message
            )
        } else {
            format!("{} {} {}", location, warning.type_name(), warning.message)
        };
        if self.show_context {
            for line in &warning.lines {
                out.push('\n');
                let line = format!("    {line}");
                if self.color {
                    out.push_str(&line.dimmed().to_string());
                } else {
                    out.push_str(&line);
                }
            }
        }
        out
    }
}

/// Pretty JSON objects with sorted keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn to_value(warning: &Warning) -> Value {
        let mut value = json!({
            "type": warning.type_name(),
            "message": warning.message,
            "file": warning.file,
            "lineno": warning.lineno(),
        });
        if warning.has_span() {
            value["start"] = location_value(warning.start);
            value["end"] = location_value(warning.end);
        }
        value
    }
}

fn location_value(location: Location) -> Value {
    json!({ "line": location.line, "column": location.column })
}

impl Formatter for JsonFormatter {
    fn format(&self, warning: &Warning) -> String {
        serde_json::to_string_pretty(&Self::to_value(warning)).unwrap_or_default()
    }

    fn format_all(&self, warnings: &[Warning]) -> String {
        let values: Vec<Value> = warnings.iter().map(Self::to_value).collect();
        serde_json::to_string_pretty(&values).unwrap_or_default()
    }
}
