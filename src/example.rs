//! Example config file generation.
//!
//! Renders every declared value as a documented TOML entry: description,
//! type, examples, then either the commented-out default or an empty
//! mandatory placeholder. Values are sorted by name and nested into
//! `[section]` blocks following their path; within a block, plain entries
//! come before sub-sections.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use toml::Value;

use crate::error::ValfigError;
use crate::resolve::file_segments;
use crate::setup::Setup;
use crate::value::{ConfigValue, Fallback, Kind, TableKey};

const WRAP_WIDTH: usize = 120;

const HEADER: &str = r#"This is an example configuration file for {app_name}.

Version: {app_version}.

WARNING: this example file is overwritten every time it is generated. Make sure to save your work under another name!

It must be renamed to "{config_file_path}" in order to come into effect.

The configuration file follows the TOML format specification, available at: https://toml.io

Mandatory and optional values
=============================

Some values are mandatory, some aren't. Mandatory values are marked with the "MANDATORY CONFIG VALUE" tag and left
empty below. If mandatory values are missing, {app_name} will not start.

Optional values are commented out; the value shown is the default used when you leave them alone.

OS environment
==============

All configuration values may also be given using the OS environment instead of the config file. The variable name is
the upper-cased application name and the upper-cased path of the value, joined with "{sep}". Values found in the
environment take precedence over the config file.

For example, the configuration "dummy_key = dummy_value" would be set in the OS environment using the variable
"{env_prefix}DUMMY_KEY=dummy_value", and "dummy_key" under "[section]" using "{env_prefix}SECTION{sep}DUMMY_KEY".

Value types
===========

Value types are checked every time a value is read."#;

/// The commented header, ending with the `START OF ACTUAL CONFIG FILE`
/// marker.
pub fn header(setup: &Setup) -> String {
    let env_prefix = format!("{}{}", setup.app_name(), setup.separator()).to_uppercase();
    let text = HEADER
        .replace("{app_name}", setup.app_name())
        .replace("{app_version}", setup.app_version())
        .replace(
            "{config_file_path}",
            &setup.config_file_path().display().to_string(),
        )
        .replace("{env_prefix}", &env_prefix)
        .replace("{sep}", setup.separator());

    let mut out: String = text.lines().map(|line| comment(line) + "\n").collect();
    out.push_str("#\n# START OF ACTUAL CONFIG FILE\n\n");
    out
}

/// Header followed by the documented values.
pub fn render(setup: &Setup, values: &[ConfigValue]) -> String {
    header(setup) + &body(setup, values)
}

/// The documented values without the header.
pub fn body(setup: &Setup, values: &[ConfigValue]) -> String {
    let mut sorted: Vec<&ConfigValue> = values.iter().collect();
    sorted.sort_by_cached_key(|v| v.name_in(setup));

    let mut root = Section::default();
    for value in sorted {
        root.insert(file_segments(value, setup), value);
    }

    let mut lines = Vec::new();
    root.render(setup, &mut Vec::new(), &mut lines);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// The body with the mandatory placeholders commented out, so it parses as
/// TOML. Used to seed a config file that does not exist yet.
pub fn seed(setup: &Setup, values: &[ConfigValue]) -> String {
    let mut out: String = body(setup, values)
        .lines()
        .map(|line| {
            if is_placeholder(line) {
                comment(line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

/// Write a rendered example to `path`, creating parent directories and
/// replacing any existing file. The example is plain output, so no lock is
/// taken.
pub fn write(path: &Path, text: &str) -> Result<(), ValfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ValfigError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, text).map_err(|e| ValfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn is_placeholder(line: &str) -> bool {
    !line.starts_with('#') && !line.starts_with('[') && line.trim_end().ends_with('=')
}

#[derive(Default)]
struct Section<'a> {
    leaves: Vec<(String, &'a ConfigValue)>,
    children: BTreeMap<String, Section<'a>>,
}

impl<'a> Section<'a> {
    fn insert(&mut self, mut segments: Vec<String>, value: &'a ConfigValue) {
        let Some(key) = segments.pop() else {
            return;
        };
        let mut section = self;
        for segment in segments {
            section = section.children.entry(segment).or_default();
        }
        section.leaves.push((key, value));
    }

    fn render(&self, setup: &Setup, path: &mut Vec<String>, out: &mut Vec<String>) {
        if !path.is_empty() && !self.leaves.is_empty() {
            out.push(format!("[{}]", dotted_key(path)));
        }
        for (key, value) in &self.leaves {
            let mut full = path.clone();
            full.push(key.clone());
            out.extend(leaf_lines(setup, key, &full, value));
            out.push(String::new());
        }
        for (name, child) in &self.children {
            path.push(name.clone());
            child.render(setup, path, out);
            path.pop();
        }
    }
}

/// Documentation lines for one value. `full_path` is used for `[[...]]`
/// headers of table examples.
fn leaf_lines(setup: &Setup, key: &str, full_path: &[String], value: &ConfigValue) -> Vec<String> {
    let mut out = wrap_comment(value.description());
    out.push(comment(&format!("value type: {}", value.kind().documented_type())));
    if let Kind::TableArray(keys) = value.kind() {
        out.extend(key_schema_lines(keys));
    }
    out.extend(value.kind().example_lines(full_path));

    let key = key_repr(key);
    match value.fallback() {
        Fallback::Value(default) => {
            out.push(comment(
                "Setting this value is not required; you can leave it commented out.",
            ));
            out.push(comment(
                "The default value (the one that will be used if you do not provide another) is shown below:",
            ));
            out.push("#".to_string());
            out.extend(
                default_lines(&key, full_path, default)
                    .iter()
                    .map(|line| comment(line)),
            );
        }
        Fallback::Unset => {
            out.push(comment(
                "Setting this value is not required; you can leave it commented out.",
            ));
            out.push(comment("It has no default value and stays unset unless you provide one."));
            out.push("#".to_string());
            out.push(comment(&format!("{key} =")));
        }
        Fallback::Required => {
            tracing::trace!(
                "{}: mandatory, rendering empty placeholder",
                value.name_in(setup)
            );
            out.push(comment(
                "MANDATORY CONFIG VALUE: you *must* provide a value for this setting",
            ));
            out.push("#".to_string());
            out.push(format!("{key} = "));
        }
    }
    out
}

fn key_schema_lines(keys: &[TableKey]) -> Vec<String> {
    let mut out = vec!["#".to_string(), comment("Type of keys:")];
    for key in keys {
        let state = match &key.default {
            None => "This key is MANDATORY".to_string(),
            Some(default) => format!(
                "This key is optional, and has a default value of: {}",
                literal(default)
            ),
        };
        for line in [
            format!("key name: {}", key.key_name),
            format!("key type: {}", key.key_type),
            key.description.clone(),
            state,
            String::new(),
        ] {
            out.push(indented_comment(&line));
        }
    }
    out
}

impl Kind {
    /// Type-specific example lines, already commented.
    pub(crate) fn example_lines(&self, full_path: &[String]) -> Vec<String> {
        match self {
            Kind::Integer(bounds) => [10, 0, -5]
                .into_iter()
                .filter(|v| bounds.contains(*v))
                .map(|v| comment(&format!("example = {v}")))
                .collect(),
            Kind::Float(bounds) => [1.5, 0.0, -0.25]
                .into_iter()
                .filter(|v| bounds.contains(*v))
                .map(|v| comment(&format!("example = {}", literal(&Value::Float(v)))))
                .collect(),
            Kind::Boolean => vec![comment("example = true"), comment("example = false")],
            Kind::List(element) => {
                let sample = Value::Array(vec![element.sample(), element.sample()]);
                vec![comment(&format!("example = {}", literal(&sample)))]
            }
            Kind::TableArray(keys) => {
                let mut out = vec![
                    comment(
                        "An array of tables is a list of tables that share a common schema of key/value pairs.",
                    ),
                    comment("example:"),
                ];
                out.push(indented_comment(&format!("[[{}]]", dotted_key(full_path))));
                for key in keys {
                    let value = key.default.clone().unwrap_or_else(|| key.key_type.sample());
                    out.push(indented_comment(&format!(
                        "{} = {}",
                        key_repr(&key.key_name),
                        literal(&value)
                    )));
                }
                out.push(comment(
                    "NOTE: the above example can be repeated as many times as needed, to create multiple tables in the array.",
                ));
                out
            }
            Kind::String | Kind::Path(_) => Vec::new(),
        }
    }
}

/// Uncommented lines showing `default`; tables become `[[...]]` blocks.
fn default_lines(key: &str, full_path: &[String], default: &Value) -> Vec<String> {
    let tables: Option<Vec<&toml::Table>> = match default {
        Value::Table(table) => Some(vec![table]),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_table) => {
            Some(items.iter().filter_map(Value::as_table).collect())
        }
        _ => None,
    };
    let Some(tables) = tables else {
        return vec![format!("{key} = {}", literal(default))];
    };

    let mut out = Vec::new();
    for table in tables {
        out.push(format!("[[{}]]", dotted_key(full_path)));
        for (k, v) in table {
            out.push(format!("{} = {}", key_repr(k), literal(v)));
        }
    }
    out
}

fn literal(value: &Value) -> String {
    value.to_string()
}

fn key_repr(key: &str) -> String {
    toml_edit::Key::new(key).to_string()
}

fn dotted_key(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| key_repr(s))
        .collect::<Vec<_>>()
        .join(".")
}

fn comment(text: &str) -> String {
    format!("# {text}").trim_end().to_string()
}

fn indented_comment(text: &str) -> String {
    comment(&format!("    {text}"))
}

fn wrap_comment(text: &str) -> Vec<String> {
    let options = textwrap::Options::new(WRAP_WIDTH)
        .initial_indent("# ")
        .subsequent_indent("# ")
        .break_words(false);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.trim_end().to_string())
        .collect()
}
