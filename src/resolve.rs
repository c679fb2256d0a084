//! Core resolution pipeline: find a value's raw form and cast it.
//!
//! Lookup is split from I/O: [`lookup`] takes the file content through a
//! closure that is only called when the environment has no match, so the
//! precedence rules are testable with synthetic inputs. Steps:
//!
//! 1. Environment variable `UPPER(app_name + sep + path)`, matched ignoring case
//! 2. The config file, walked by splitting the path on the separator
//! 3. The declared default
//!
//! The first raw value found goes through the kind's cast.

use std::fmt;
use std::path::PathBuf;

use toml::{Table, Value};

use crate::env::{EnvSource, coerce};
use crate::error::ValfigError;
use crate::file::{ConfigFile, table_get};
use crate::setup::Setup;
use crate::value::{ConfigValue, Fallback, Resolved};

/// Where a raw value came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// The named environment variable.
    Environment(String),
    /// The config file.
    File(PathBuf),
    /// The declared default.
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Environment(var) => write!(f, "environment variable {var}"),
            Source::File(path) => write!(f, "config file {}", path.display()),
            Source::Default => f.write_str("default value"),
        }
    }
}

/// A value as found, before casting.
#[derive(Debug, Clone, PartialEq)]
pub struct RawValue {
    pub value: Value,
    pub source: Source,
}

/// Segments used to walk the config file: the full path split on the
/// separator.
pub fn file_segments(value: &ConfigValue, setup: &Setup) -> Vec<String> {
    let path = value.path_in(setup);
    let sep = setup.separator();
    if sep.is_empty() {
        return vec![path];
    }
    path.split(sep).map(str::to_string).collect()
}

/// Find the raw value in priority order. `Ok(None)` means no source holds
/// one and no default is declared.
pub fn lookup<F>(
    value: &ConfigValue,
    setup: &Setup,
    env: &EnvSource,
    read_file: F,
) -> Result<Option<RawValue>, ValfigError>
where
    F: FnOnce() -> Result<Table, ValfigError>,
{
    let var_name = setup.env_var_name(&value.path_in(setup));
    if let Some((var, raw)) = env.lookup(&var_name) {
        return Ok(Some(RawValue {
            value: coerce(&raw, value.kind().env_coercion()),
            source: Source::Environment(var),
        }));
    }

    let table = read_file()?;
    if let Some(found) = table_get(&table, &file_segments(value, setup)) {
        return Ok(Some(RawValue {
            value: found.clone(),
            source: Source::File(setup.config_file_path().to_path_buf()),
        }));
    }

    Ok(match value.fallback() {
        Fallback::Value(default) => Some(RawValue {
            value: default.clone(),
            source: Source::Default,
        }),
        Fallback::Required | Fallback::Unset => None,
    })
}

/// Resolve with the file content supplied by `read_file`.
///
/// `Ok(None)` is only returned for values declared optional; a required value
/// with no source fails with [`ValfigError::MissingValue`].
pub fn resolve_with<F>(
    value: &ConfigValue,
    setup: &Setup,
    env: &EnvSource,
    read_file: F,
) -> Result<Option<Resolved>, ValfigError>
where
    F: FnOnce() -> Result<Table, ValfigError>,
{
    setup.check()?;
    let name = value.name_in(setup);
    match lookup(value, setup, env, read_file)? {
        Some(raw) => {
            tracing::debug!("{name}: resolved from {}", raw.source);
            value.kind().cast(&name, raw.value).map(Some)
        }
        None if value.fallback().is_required() => Err(ValfigError::MissingValue { name }),
        None => {
            tracing::debug!("{name}: not set");
            Ok(None)
        }
    }
}

/// Resolve against the setup's config file.
pub fn resolve(
    value: &ConfigValue,
    setup: &Setup,
    env: &EnvSource,
) -> Result<Option<Resolved>, ValfigError> {
    resolve_with(value, setup, env, || {
        ConfigFile::new(setup.config_file_path()).read()
    })
}
