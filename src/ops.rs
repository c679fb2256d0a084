//! Config operations output: the result type callers display, and value
//! formatting shared by `list`, `get` and `set`.

use std::fmt;
use std::path::PathBuf;

use toml::Value;

use crate::validate::{UnknownKey, ValidationReport};
use crate::value::Resolved;

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A generated example config file.
    Template(String),
    /// Confirmation that the example was written to a file.
    TemplateWritten { path: PathBuf },
    /// A value's resolved form and its description.
    KeyValue {
        name: String,
        value: String,
        doc: Vec<String>,
    },
    /// Confirmation that a value was persisted.
    ValueSet { name: String, value: String },
    /// Confirmation that a value was removed.
    ValueUnset { name: String },
    /// Every declared value with its resolved form, or the resolution error.
    Listing { entries: Vec<(String, String)> },
    /// Outcome of a validation run.
    Checked {
        report: ValidationReport,
        unknown: Vec<UnknownKey>,
    },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Template(t) => write!(f, "{t}"),
            ConfigResult::TemplateWritten { path } => {
                write!(f, "Example config written to {}", path.display())
            }
            ConfigResult::KeyValue { name, value, doc } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{name} = {value}")
            }
            ConfigResult::ValueSet { name, value } => write!(f, "Set {name} = {value}"),
            ConfigResult::ValueUnset { name } => write!(f, "Unset {name}"),
            ConfigResult::Listing { entries } => {
                for (i, (name, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{name} = {value}")?;
                }
                Ok(())
            }
            ConfigResult::Checked { report, unknown } => {
                if report.is_ok() && unknown.is_empty() {
                    return write!(f, "Configuration is valid");
                }
                let mut lines = Vec::new();
                if !report.duplicates.is_empty() {
                    lines.push(format!("Duplicate values: {}", report.duplicates.join(", ")));
                }
                if !report.missing.is_empty() {
                    lines.push(format!("Missing values: {}", report.missing.join(", ")));
                }
                for key in unknown {
                    lines.push(match key.line {
                        0 => format!("Unknown key: {}", key.key),
                        line => format!("Unknown key: {} (line {line})", key.key),
                    });
                }
                write!(f, "{}", lines.join("\n"))
            }
        }
    }
}

/// Format a TOML value for display. Strings are shown bare.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Format an optional resolved value; `None` shows as `<not set>`.
pub fn format_resolved(resolved: Option<&Resolved>) -> String {
    match resolved {
        Some(Resolved::Path(p)) => p.display().to_string(),
        Some(other) => format_value(&other.to_value()),
        None => "<not set>".to_string(),
    }
}
