//! Registry-wide checks: duplicate paths, missing values, unknown file keys.
//!
//! [`validate`] resolves every declared value once, in declaration order.
//! Duplicates and missing values are collected so a single run reports all of
//! them; any other resolution error (bad type, out of bounds, unreadable file)
//! is returned as soon as it is hit.

use std::collections::HashSet;
use std::path::Path;

use toml::{Table, Value};

use crate::env::EnvSource;
use crate::error::ValfigError;
use crate::file::ConfigFile;
use crate::resolve::{file_segments, resolve_with};
use crate::setup::Setup;
use crate::value::ConfigValue;

/// What a validation run found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Names of values declared more than once for the same path.
    pub duplicates: Vec<String>,
    /// Names of mandatory values with no source.
    pub missing: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.duplicates.is_empty() && self.missing.is_empty()
    }

    /// The report as a single error, `None` when clean.
    pub fn into_error(self) -> Option<ValfigError> {
        let mut errors = Vec::new();
        if !self.duplicates.is_empty() {
            errors.push(ValfigError::DuplicatePaths {
                names: self.duplicates,
            });
        }
        if !self.missing.is_empty() {
            errors.push(ValfigError::MissingValues {
                names: self.missing,
            });
        }
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ValfigError::Validation(errors)),
        }
    }
}

/// Check every declared value.
///
/// With `raise`, a report with findings is turned into an error (see
/// [`ValidationReport::into_error`]); otherwise it is returned as is.
pub fn validate(
    values: &[ConfigValue],
    setup: &Setup,
    env: &EnvSource,
    raise: bool,
) -> Result<ValidationReport, ValfigError> {
    setup.check()?;

    let file = ConfigFile::new(setup.config_file_path());
    let mut cache: Option<Table> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut report = ValidationReport::default();

    for value in values {
        let name = value.name_in(setup);
        if !seen.insert(value.path_in(setup)) {
            tracing::warn!("{name}: declared more than once");
            if !report.duplicates.contains(&name) {
                report.duplicates.push(name.clone());
            }
        }

        match resolve_with(value, setup, env, || read_cached(&file, &mut cache)) {
            Ok(_) => {}
            Err(ValfigError::MissingValue { name }) => {
                if !report.missing.contains(&name) {
                    report.missing.push(name);
                }
            }
            Err(e) => return Err(e),
        }
    }

    if raise && let Some(err) = report.clone().into_error() {
        return Err(err);
    }
    Ok(report)
}

/// Read the file on first use, then serve the cached table.
pub(crate) fn read_cached(file: &ConfigFile, cache: &mut Option<Table>) -> Result<Table, ValfigError> {
    if let Some(table) = cache {
        return Ok(table.clone());
    }
    let table = file.read()?;
    *cache = Some(table.clone());
    Ok(table)
}

/// A key present in the config file that matches no declared value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey {
    /// Dotted path of the key.
    pub key: String,
    /// 1-indexed line, 0 when it could not be located.
    pub line: usize,
}

/// Find file keys that no declared value reads.
///
/// A key is known when its path equals a declared path (its content is then
/// the value's business, e.g. a table-array) or is a prefix of one.
pub fn unknown_keys(
    values: &[ConfigValue],
    setup: &Setup,
) -> Result<Vec<UnknownKey>, ValfigError> {
    setup.check()?;
    let file = ConfigFile::new(setup.config_file_path());
    let Some(content) = file.read_text()? else {
        return Ok(Vec::new());
    };
    let table = crate::file::parse_document(&content, file.path())?;

    let declared: Vec<Vec<String>> = values.iter().map(|v| file_segments(v, setup)).collect();
    let mut found = Vec::new();
    collect_unknown(&table, &mut Vec::new(), &declared, &mut found);

    let unknown: Vec<UnknownKey> = found
        .into_iter()
        .map(|segments| {
            let key = segments.join(".");
            let line = find_key_line(&content, &segments);
            UnknownKey { key, line }
        })
        .collect();
    for key in &unknown {
        warn_unknown(file.path(), key);
    }
    Ok(unknown)
}

fn warn_unknown(path: &Path, key: &UnknownKey) {
    if key.line > 0 {
        tracing::warn!(
            "Unknown key '{}' in {} (line {})",
            key.key,
            path.display(),
            key.line
        );
    } else {
        tracing::warn!("Unknown key '{}' in {}", key.key, path.display());
    }
}

fn collect_unknown(
    table: &Table,
    prefix: &mut Vec<String>,
    declared: &[Vec<String>],
    out: &mut Vec<Vec<String>>,
) {
    for (key, value) in table {
        prefix.push(key.clone());
        let exact = declared.iter().any(|d| d.as_slice() == prefix.as_slice());
        let parent = declared
            .iter()
            .any(|d| d.len() > prefix.len() && d.starts_with(prefix.as_slice()));
        if !exact {
            match value {
                Value::Table(inner) if parent => collect_unknown(inner, prefix, declared, out),
                _ => out.push(prefix.clone()),
            }
        }
        prefix.pop();
    }
}

/// Find the 1-indexed line number for a key in TOML content.
///
/// Tracks the current `[section]` header while scanning and only matches the
/// leaf key when inside the expected section. Handles standard headers and
/// bare keys, not quoted keys or inline tables. Returns 0 if the key cannot be
/// located.
fn find_key_line(content: &str, segments: &[String]) -> usize {
    let Some((leaf, expected_section)) = segments.split_last() else {
        return 0;
    };

    let mut current_section: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(|s| s.trim().to_string()).collect();
            // A section header can itself be the unknown key.
            if current_section == segments {
                return i + 1;
            }
            continue;
        }

        if current_section == expected_section
            && let Some(after_key) = trimmed.strip_prefix(leaf.as_str())
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{TestEnv, write_config};
    use crate::types::ValueType;
    use crate::value::TableKey;

    #[test]
    fn clean_registry_passes() {
        let env = TestEnv::new();
        let values = vec![
            ConfigValue::string(["host"], "Host")
                .default("localhost")
                .into_config_value(),
            ConfigValue::integer(["port"], "Port")
                .default(8080)
                .into_config_value(),
        ];
        let report = validate(&values, &env.setup, &EnvSource::Disabled, true).unwrap();
        assert!(report.is_ok());
    }

    #[test]
    fn duplicate_and_missing_reported_together() {
        let env = TestEnv::new();
        let values = vec![
            ConfigValue::string(["a"], "A").into_config_value(),
            ConfigValue::string(["a"], "A again").into_config_value(),
            ConfigValue::string(["b"], "B").into_config_value(),
        ];
        let report = validate(&values, &env.setup, &EnvSource::Disabled, false).unwrap();
        assert_eq!(report.duplicates, vec!["a"]);
        assert_eq!(report.missing, vec!["a", "b"]);

        let err = validate(&values, &env.setup, &EnvSource::Disabled, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "config validation failed: duplicate config values: a; missing config values: a, b"
        );
        match err {
            ValfigError::Validation(errors) => {
                assert!(matches!(errors[0], ValfigError::DuplicatePaths { .. }));
                assert!(matches!(errors[1], ValfigError::MissingValues { .. }));
            }
            other => panic!("Expected Validation, got: {other:?}"),
        }
    }

    #[test]
    fn missing_only_raises_missing_values() {
        let env = TestEnv::new();
        let values = vec![
            ConfigValue::string(["a"], "A").into_config_value(),
            ConfigValue::string(["b"], "B").default("x").into_config_value(),
        ];
        match validate(&values, &env.setup, &EnvSource::Disabled, true).unwrap_err() {
            ValfigError::MissingValues { names } => assert_eq!(names, vec!["a"]),
            other => panic!("Expected MissingValues, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_only_raises_duplicate_paths() {
        let env = TestEnv::new();
        let values = vec![
            ConfigValue::string(["a"], "A").default("x").into_config_value(),
            ConfigValue::string(["a"], "A").default("y").into_config_value(),
        ];
        let err = validate(&values, &env.setup, &EnvSource::Disabled, true).unwrap_err();
        assert!(matches!(err, ValfigError::DuplicatePaths { .. }));
    }

    #[test]
    fn other_errors_propagate_immediately() {
        let env = TestEnv::new();
        write_config(&env, "port = \"high\"\n");
        let values = vec![
            ConfigValue::integer(["port"], "Port").into_config_value(),
            ConfigValue::string(["missing"], "Missing").into_config_value(),
        ];
        let err = validate(&values, &env.setup, &EnvSource::Disabled, false).unwrap_err();
        assert!(matches!(err, ValfigError::TypeMismatch { .. }));
    }

    #[test]
    fn optional_values_are_not_missing() {
        let env = TestEnv::new();
        let values = vec![ConfigValue::string(["a"], "A").optional().into_config_value()];
        assert!(validate(&values, &env.setup, &EnvSource::Disabled, true)
            .unwrap()
            .is_ok());
    }

    #[test]
    fn incomplete_setup_fails() {
        let err = validate(&[], &Setup::default(), &EnvSource::Disabled, false).unwrap_err();
        assert!(matches!(err, ValfigError::IncompleteSetup { .. }));
    }

    #[test]
    fn unknown_keys_found_with_lines() {
        let env = TestEnv::new();
        write_config(
            &env,
            "host = \"x\"\ntypo = 1\n\n[server]\nport = 1\nextra = true\n\n[other]\nkey = 2\n",
        );
        let values = vec![
            ConfigValue::string(["host"], "Host").into_config_value(),
            ConfigValue::integer(["server", "port"], "Port").into_config_value(),
        ];
        let unknown = unknown_keys(&values, &env.setup).unwrap();
        assert_eq!(
            unknown,
            vec![
                UnknownKey {
                    key: "other".into(),
                    line: 8
                },
                UnknownKey {
                    key: "server.extra".into(),
                    line: 6
                },
                UnknownKey {
                    key: "typo".into(),
                    line: 2
                },
            ]
        );
    }

    #[test]
    fn table_array_content_is_not_unknown() {
        let env = TestEnv::new();
        write_config(&env, "[[servers]]\nhost = \"a\"\nanything = 1\n");
        let values = vec![
            ConfigValue::table_array(
                ["servers"],
                vec![TableKey::new("host", ValueType::String, "Host")],
                "Servers",
            )
            .into_config_value(),
        ];
        assert!(unknown_keys(&values, &env.setup).unwrap().is_empty());
    }

    #[test]
    fn unknown_keys_without_file_is_empty() {
        let env = TestEnv::new();
        assert!(unknown_keys(&[], &env.setup).unwrap().is_empty());
    }

    #[test]
    fn key_line_in_nested_section() {
        let content = "[a]\nx = 1\n[a.b]\nx = 2\n";
        assert_eq!(find_key_line(content, &["a".into(), "b".into(), "x".into()]), 4);
        assert_eq!(find_key_line(content, &["a".into(), "x".into()]), 2);
        assert_eq!(find_key_line(content, &["nope".into()]), 0);
    }
}
