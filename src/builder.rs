use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::env::{EnvSource, coerce};
use crate::error::ValfigError;
use crate::example;
use crate::file::ConfigFile;
use crate::ops::{ConfigResult, format_resolved};
use crate::persist;
use crate::resolve::{self, file_segments};
use crate::setup::{Setup, platform_config_file};
use crate::types::ConfigAction;
use crate::validate::{self, UnknownKey, ValidationReport, read_cached};
use crate::value::{
    Bounded, ConfigValue, Declaration, Fallback, FromResolved, Handle, Kind, PathRule, Resolved,
};

/// A configuration context: the setup, where environment variables come from,
/// and the registry of declared values.
///
/// Values are resolved every time they are read, so changes to the
/// environment or the config file are picked up without reloading.
#[derive(Debug, Clone)]
pub struct Valfig {
    setup: Setup,
    env: EnvSource,
    values: Vec<ConfigValue>,
}

impl Valfig {
    pub fn builder() -> ValfigBuilder {
        ValfigBuilder::new()
    }

    /// A context reading the process environment.
    pub fn new(setup: Setup) -> Self {
        Self::with_env(setup, EnvSource::Process)
    }

    pub fn with_env(setup: Setup, env: EnvSource) -> Self {
        Self {
            setup,
            env,
            values: Vec::new(),
        }
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    pub fn setup_mut(&mut self) -> &mut Setup {
        &mut self.setup
    }

    pub fn env(&self) -> &EnvSource {
        &self.env
    }

    /// Register a value. Duplicate paths are accepted here and reported by
    /// [`validate`](Self::validate).
    pub fn declare<T>(&mut self, declaration: Declaration<T>) -> Result<Handle<T>, ValfigError> {
        let value = declaration.into_config_value();
        if value.raw_path().is_empty() {
            return Err(ValfigError::EmptyPath);
        }
        self.values.push(value);
        Ok(Handle::new(self.values.len() - 1))
    }

    /// Declared values, in declaration order.
    pub fn values(&self) -> &[ConfigValue] {
        &self.values
    }

    /// Forget every declared value. Existing handles become invalid.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn value<T>(&self, handle: &Handle<T>) -> Result<&ConfigValue, ValfigError> {
        self.values
            .get(handle.index())
            .ok_or_else(|| ValfigError::UnknownValue(format!("#{}", handle.index())))
    }

    fn value_mut<T>(&mut self, handle: &Handle<T>) -> Result<&mut ConfigValue, ValfigError> {
        self.values
            .get_mut(handle.index())
            .ok_or_else(|| ValfigError::UnknownValue(format!("#{}", handle.index())))
    }

    /// Look a value up by its dotted name (root path included).
    pub fn find(&self, name: &str) -> Option<&ConfigValue> {
        self.values.iter().find(|v| v.name_in(&self.setup) == name)
    }

    fn find_or_err(&self, name: &str) -> Result<&ConfigValue, ValfigError> {
        self.find(name)
            .ok_or_else(|| ValfigError::UnknownValue(name.to_string()))
    }

    /// Resolve and cast a value. `Ok(None)` only for optional values.
    pub fn resolve<T>(&self, handle: &Handle<T>) -> Result<Option<Resolved>, ValfigError> {
        resolve::resolve(self.value(handle)?, &self.setup, &self.env)
    }

    /// The typed value. An optional value that is not set anywhere fails
    /// with [`ValfigError::MissingValue`]; use [`get_opt`](Self::get_opt) to
    /// accept absence.
    pub fn get<T: FromResolved>(&self, handle: &Handle<T>) -> Result<T, ValfigError> {
        let name = self.value(handle)?.name_in(&self.setup);
        match self.resolve(handle)? {
            Some(resolved) => T::from_resolved(&name, resolved),
            None => Err(ValfigError::MissingValue { name }),
        }
    }

    pub fn get_opt<T: FromResolved>(&self, handle: &Handle<T>) -> Result<Option<T>, ValfigError> {
        let name = self.value(handle)?.name_in(&self.setup);
        self.resolve(handle)?
            .map(|resolved| T::from_resolved(&name, resolved))
            .transpose()
    }

    /// Deserialize the resolved value into any serde type.
    pub fn get_as<T, D: DeserializeOwned>(&self, handle: &Handle<T>) -> Result<D, ValfigError> {
        let name = self.value(handle)?.name_in(&self.setup);
        let resolved = self
            .resolve(handle)?
            .ok_or_else(|| ValfigError::MissingValue { name: name.clone() })?;
        resolved
            .to_value()
            .try_into()
            .map_err(|e: toml::de::Error| ValfigError::Deserialize {
                name,
                reason: e.message().to_string(),
            })
    }

    /// One key of a resolved table. Only keys declared in the schema can be
    /// read; key defaults apply.
    pub fn table_key(&self, handle: &Handle<Table>, key: &str) -> Result<Value, ValfigError> {
        let value = self.value(handle)?;
        let name = value.name_in(&self.setup);
        let declared = match value.kind() {
            Kind::TableArray(keys) => keys.iter().any(|k| k.key_name == key),
            _ => false,
        };
        if !declared {
            return Err(ValfigError::UnknownTableKey {
                name,
                key: key.to_string(),
            });
        }
        let mut table = self.get(handle)?;
        table
            .remove(key)
            .ok_or_else(|| ValfigError::MissingTableKey {
                name,
                key: key.to_string(),
            })
    }

    /// Replace the default of a declared value.
    pub fn set_default<T>(
        &mut self,
        handle: &Handle<T>,
        value: impl Into<Value>,
    ) -> Result<(), ValfigError> {
        self.value_mut(handle)?
            .set_fallback(Fallback::Value(value.into()));
        Ok(())
    }

    pub fn set_limits<T: Bounded>(
        &mut self,
        handle: &Handle<T>,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<(), ValfigError> {
        self.value_mut(handle)?.set_limits(min, max);
        Ok(())
    }

    /// Add a constraint to a path value. File and directory rules exclude each
    /// other.
    pub fn require_path(
        &mut self,
        handle: &Handle<PathBuf>,
        rule: PathRule,
    ) -> Result<(), ValfigError> {
        let name = self.value(handle)?.name_in(&self.setup);
        self.value_mut(handle)?.apply_path_rule_as(rule, &name)
    }

    /// Resolve every value; see [`validate::validate`].
    pub fn validate(&self, raise: bool) -> Result<ValidationReport, ValfigError> {
        validate::validate(&self.values, &self.setup, &self.env, raise)
    }

    /// Keys in the config file that match no declared value.
    pub fn unknown_keys(&self) -> Result<Vec<UnknownKey>, ValfigError> {
        validate::unknown_keys(&self.values, &self.setup)
    }

    /// The documented example config file.
    pub fn example_text(&self) -> Result<String, ValfigError> {
        self.setup.check()?;
        Ok(example::render(&self.setup, &self.values))
    }

    /// Write the example config file, replacing any existing file and creating
    /// parent directories.
    pub fn write_example(&self, path: impl AsRef<Path>) -> Result<(), ValfigError> {
        let text = self.example_text()?;
        example::write(path.as_ref(), &text)?;
        tracing::info!("Example config written to {}", path.as_ref().display());
        Ok(())
    }

    /// Every declared value with its displayed form. Values that fail to
    /// resolve show the error instead.
    pub fn list(&self) -> Result<Vec<(String, String)>, ValfigError> {
        self.setup.check()?;
        let file = ConfigFile::new(self.setup.config_file_path());
        let mut cache = None;
        let entries = self
            .values
            .iter()
            .map(|value| {
                let shown = match resolve::resolve_with(value, &self.setup, &self.env, || {
                    read_cached(&file, &mut cache)
                }) {
                    Ok(resolved) => format_resolved(resolved.as_ref()),
                    Err(e) => format!("<error: {e}>"),
                };
                (value.name_in(&self.setup), shown)
            })
            .collect();
        Ok(entries)
    }

    /// A value by name, with its description and documented type.
    pub fn describe(&self, name: &str) -> Result<ConfigResult, ValfigError> {
        let value = self.find_or_err(name)?;
        let resolved = resolve::resolve(value, &self.setup, &self.env)?;
        Ok(ConfigResult::KeyValue {
            name: name.to_string(),
            value: format_resolved(resolved.as_ref()),
            doc: vec![
                value.description().to_string(),
                format!("value type: {}", value.kind().documented_type()),
            ],
        })
    }

    /// Persist a raw value into the config file.
    ///
    /// The raw string is interpreted like an environment variable for the
    /// value's type and cast before anything is written, so an invalid value
    /// never reaches the file. A missing file is created from the documented
    /// example body.
    pub fn set_value(&self, name: &str, raw: &str) -> Result<ConfigResult, ValfigError> {
        self.setup.check()?;
        let value = self.find_or_err(name)?;
        let coerced = coerce(raw, value.kind().input_coercion());
        value.kind().cast(name, coerced.clone())?;

        let file = ConfigFile::new(self.setup.config_file_path());
        persist::persist_value(
            &file,
            || example::seed(&self.setup, &self.values),
            name,
            &file_segments(value, &self.setup),
            &coerced,
        )
    }

    /// Remove a value from the config file.
    pub fn unset_value(&self, name: &str) -> Result<ConfigResult, ValfigError> {
        self.setup.check()?;
        let value = self.find_or_err(name)?;
        let file = ConfigFile::new(self.setup.config_file_path());
        persist::unset_value(&file, name, &file_segments(value, &self.setup))
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(&self, action: &ConfigAction) -> Result<(), ValfigError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / gen / get / set / unset / check).
    pub fn handle(&self, action: &ConfigAction) -> Result<ConfigResult, ValfigError> {
        match action {
            ConfigAction::List => Ok(ConfigResult::Listing {
                entries: self.list()?,
            }),
            ConfigAction::Gen { output } => match output {
                Some(path) => {
                    self.write_example(path)?;
                    Ok(ConfigResult::TemplateWritten { path: path.clone() })
                }
                None => Ok(ConfigResult::Template(self.example_text()?)),
            },
            ConfigAction::Get { name } => self.describe(name),
            ConfigAction::Set { name, value } => self.set_value(name, value),
            ConfigAction::Unset { name } => self.unset_value(name),
            ConfigAction::Check => Ok(ConfigResult::Checked {
                report: self.validate(false)?,
                unknown: self.unknown_keys()?,
            }),
        }
    }
}

/// Builder for a [`Valfig`] context.
///
/// `separator` defaults to `"__"`; every other setup field must be given,
/// otherwise reading a value fails with [`ValfigError::IncompleteSetup`].
#[derive(Debug, Clone)]
pub struct ValfigBuilder {
    app_name: Option<String>,
    app_version: Option<String>,
    config_file: Option<PathBuf>,
    platform_file_name: Option<String>,
    separator: String,
    root_path: Vec<String>,
    env: EnvSource,
}

impl ValfigBuilder {
    fn new() -> Self {
        Self {
            app_name: None,
            app_version: None,
            config_file: None,
            platform_file_name: None,
            separator: "__".to_string(),
            root_path: Vec::new(),
            env: EnvSource::Process,
        }
    }

    /// Set the application name. It prefixes every environment variable.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    pub fn app_version(mut self, version: &str) -> Self {
        self.app_version = Some(version.to_string());
        self
    }

    /// Explicit config file location.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self.platform_file_name = None;
        self
    }

    /// Place the config file in the platform config directory for the app
    /// (XDG on Linux, `~/Library/Application Support` on macOS).
    pub fn config_file_in_platform_dir(mut self, file_name: &str) -> Self {
        self.platform_file_name = Some(file_name.to_string());
        self.config_file = None;
        self
    }

    /// Separator between path segments, in environment variable names and
    /// when walking the config file (default: `"__"`).
    pub fn separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Segments prepended to every declared path.
    pub fn root_path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_path = segments.into_iter().map(Into::into).collect();
        self
    }

    /// Read environment variables from a fixed list instead of the process.
    pub fn env_vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.env = EnvSource::Vars(vars);
        self
    }

    /// Disable environment variable lookup entirely.
    pub fn no_env(mut self) -> Self {
        self.env = EnvSource::Disabled;
        self
    }

    /// The config file path, if one can be determined.
    fn effective_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_file {
            return Some(path.clone());
        }
        let file_name = self.platform_file_name.as_deref()?;
        let app_name = self.app_name.as_deref()?;
        let path = platform_config_file(app_name, file_name);
        if path.is_none() {
            tracing::warn!("No platform config directory for {app_name}");
        }
        path
    }

    pub fn build(self) -> Valfig {
        let mut setup = Setup::default();
        if let Some(name) = &self.app_name {
            setup.set_app_name(name);
        }
        if let Some(version) = &self.app_version {
            setup.set_app_version(version);
        }
        if let Some(path) = self.effective_config_file() {
            setup.set_config_file_path(path);
        }
        setup.set_separator(&self.separator);
        setup.set_root_path(self.root_path);
        Valfig::with_env(setup, self.env)
    }
}
