//! Declared configuration values.
//!
//! A [`ConfigValue`] is a named, described, typed slot. Its [`Kind`] is one of
//! a closed set of variants; each variant carries its own constraints (numeric
//! bounds, path rules, list element type, table key schema) and knows how to
//! cast a raw TOML value (see the `cast` module).
//!
//! Values are declared through typed [`Declaration`]s and registered in a
//! [`Valfig`](crate::Valfig) context, which hands back a [`Handle`] used to
//! read the resolved value:
//!
//! ```ignore
//! let port = valfig.declare(
//!     ConfigValue::integer(["server", "port"], "Port to listen on")
//!         .default(8080)
//!         .limits(Some(1), Some(65535)),
//! )?;
//! let port: i64 = valfig.get(&port)?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::Serialize;
use toml::{Table, Value};

use crate::error::ValfigError;
use crate::setup::Setup;
use crate::types::ValueType;

/// What to use when neither the environment nor the file provide a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Fallback {
    /// No default: the value is mandatory.
    #[default]
    Required,
    /// The value may be absent everywhere; it then resolves to nothing.
    Unset,
    /// A concrete default.
    Value(Value),
}

impl Fallback {
    pub fn is_required(&self) -> bool {
        matches!(self, Fallback::Required)
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy + fmt::Display> Bounds<T> {
    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    pub fn check(&self, name: &str, value: T) -> Result<T, ValfigError> {
        if self.contains(value) {
            return Ok(value);
        }
        Err(ValfigError::OutOfBound {
            name: name.to_string(),
            value: value.to_string(),
            min: display_bound(self.min),
            max: display_bound(self.max),
        })
    }

    /// `"min: 1, max: 10"`, or `None` when unbounded.
    pub fn describe(&self) -> Option<String> {
        let parts: Vec<String> = [("min", self.min), ("max", self.max)]
            .into_iter()
            .filter_map(|(label, bound)| bound.map(|b| format!("{label}: {b}")))
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

fn display_bound<T: fmt::Display>(bound: Option<T>) -> String {
    bound.map_or_else(|| "none".to_string(), |b| b.to_string())
}

/// Constraints checked on a resolved path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathRules {
    pub must_exist: bool,
    pub must_be_file: bool,
    pub must_be_dir: bool,
    pub create_dir: bool,
}

/// One constraint for a path value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRule {
    /// The path must exist before it is read.
    MustExist,
    /// If it exists, the path must be a file.
    MustBeFile,
    /// If it exists, the path must be a directory.
    MustBeDir,
    /// If it doesn't exist, create it as a directory.
    CreateDir,
}

/// A file rule requested on a directory path, or the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRuleConflict {
    pub existing: &'static str,
    pub requested: &'static str,
}

impl PathRules {
    /// File and directory rules exclude each other; whichever comes first wins.
    pub fn apply(&mut self, rule: PathRule) -> Result<(), PathRuleConflict> {
        match rule {
            PathRule::MustExist => self.must_exist = true,
            PathRule::CreateDir => self.create_dir = true,
            PathRule::MustBeFile => {
                if self.must_be_dir {
                    return Err(PathRuleConflict {
                        existing: "directory",
                        requested: "file",
                    });
                }
                self.must_be_file = true;
            }
            PathRule::MustBeDir => {
                if self.must_be_file {
                    return Err(PathRuleConflict {
                        existing: "file",
                        requested: "directory",
                    });
                }
                self.must_be_dir = true;
            }
        }
        Ok(())
    }

    /// Active rules, worded for documentation.
    pub fn describe(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.must_be_file {
            out.push("must be a file");
        }
        if self.must_be_dir {
            out.push("must be a directory");
        }
        if self.must_exist {
            out.push("must already exist");
        }
        if self.create_dir {
            out.push("created as a directory if missing");
        }
        out
    }
}

/// One key of a table-array schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TableKey {
    pub key_name: String,
    pub key_type: ValueType,
    pub description: String,
    pub default: Option<Value>,
}

impl TableKey {
    /// A mandatory key.
    pub fn new(key_name: &str, key_type: ValueType, description: &str) -> Self {
        Self {
            key_name: key_name.to_string(),
            key_type,
            description: description.to_string(),
            default: None,
        }
    }

    /// Make the key optional, filled with `value` when absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn is_mandatory(&self) -> bool {
        self.default.is_none()
    }
}

/// The declared type of a value and its type-specific constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Boolean,
    String,
    Integer(Bounds<i64>),
    Float(Bounds<f64>),
    Path(PathRules),
    List(ValueType),
    TableArray(Vec<TableKey>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue {
    raw_path: Vec<String>,
    description: String,
    default: Fallback,
    kind: Kind,
}

impl ConfigValue {
    fn declaration<T, P, S>(path: P, description: &str, kind: Kind) -> Declaration<T>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Declaration {
            value: ConfigValue {
                raw_path: path.into_iter().map(Into::into).collect(),
                description: description.to_string(),
                default: Fallback::Required,
                kind,
            },
            _marker: PhantomData,
        }
    }

    pub fn boolean<P, S>(path: P, description: &str) -> Declaration<bool>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declaration(path, description, Kind::Boolean)
    }

    pub fn string<P, S>(path: P, description: &str) -> Declaration<String>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declaration(path, description, Kind::String)
    }

    pub fn integer<P, S>(path: P, description: &str) -> Declaration<i64>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declaration(path, description, Kind::Integer(Bounds::default()))
    }

    pub fn float<P, S>(path: P, description: &str) -> Declaration<f64>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declaration(path, description, Kind::Float(Bounds::default()))
    }

    pub fn path<P, S>(path: P, description: &str) -> Declaration<PathBuf>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declaration(path, description, Kind::Path(PathRules::default()))
    }

    /// A list whose elements must all be of `element_type`.
    pub fn list<P, S>(path: P, element_type: ValueType, description: &str) -> Declaration<Vec<Value>>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declaration(path, description, Kind::List(element_type))
    }

    /// A table checked against a key schema. See [`Declaration::many`] for
    /// reading an array of such tables.
    pub fn table_array<P, S>(path: P, keys: Vec<TableKey>, description: &str) -> Declaration<Table>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declaration(path, description, Kind::TableArray(keys))
    }

    pub fn raw_path(&self) -> &[String] {
        &self.raw_path
    }

    /// Last segment of the declared path.
    pub fn key(&self) -> &str {
        self.raw_path.last().map(String::as_str).unwrap_or_default()
    }

    /// Separator-joined path, root path included.
    pub fn path_in(&self, setup: &Setup) -> String {
        setup.join_path(&self.raw_path)
    }

    /// Dotted, human-readable name used in messages and documentation.
    pub fn name_in(&self, setup: &Setup) -> String {
        setup
            .root_segments()
            .iter()
            .chain(&self.raw_path)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn fallback(&self) -> &Fallback {
        &self.default
    }

    pub fn set_fallback(&mut self, fallback: Fallback) {
        self.default = fallback;
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn raw_name(&self) -> String {
        self.raw_path.join(".")
    }
}

/// A value being declared, typed by what it resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration<T> {
    value: ConfigValue,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Declaration<T> {
    /// Default used when neither the environment nor the file set the value.
    ///
    /// The default is cast like any other raw value when it is resolved.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.value.default = Fallback::Value(value.into());
        self
    }

    /// Default from any serializable value.
    ///
    /// The value is not registered yet, so an [`InvalidDefault`] error names
    /// it by its declared path, without any root path.
    ///
    /// [`InvalidDefault`]: ValfigError::InvalidDefault
    pub fn default_from<D: Serialize>(mut self, value: &D) -> Result<Self, ValfigError> {
        let value = Value::try_from(value).map_err(|e| ValfigError::InvalidDefault {
            name: self.value.raw_name(),
            reason: e.to_string(),
        })?;
        self.value.default = Fallback::Value(value);
        Ok(self)
    }

    /// Allow the value to be absent everywhere.
    pub fn optional(mut self) -> Self {
        self.value.default = Fallback::Unset;
        self
    }

    pub fn config_value(&self) -> &ConfigValue {
        &self.value
    }

    pub fn into_config_value(self) -> ConfigValue {
        self.value
    }
}

/// Numeric types that accept inclusive bounds.
pub trait Bounded: Copy {
    fn bounds_mut(kind: &mut Kind) -> Option<&mut Bounds<Self>>;
}

impl Bounded for i64 {
    fn bounds_mut(kind: &mut Kind) -> Option<&mut Bounds<i64>> {
        match kind {
            Kind::Integer(bounds) => Some(bounds),
            _ => None,
        }
    }
}

impl Bounded for f64 {
    fn bounds_mut(kind: &mut Kind) -> Option<&mut Bounds<f64>> {
        match kind {
            Kind::Float(bounds) => Some(bounds),
            _ => None,
        }
    }
}

impl ConfigValue {
    /// Replace the numeric bounds. Ignored for non-numeric kinds.
    pub fn set_limits<T: Bounded>(&mut self, min: Option<T>, max: Option<T>) {
        if let Some(bounds) = T::bounds_mut(&mut self.kind) {
            *bounds = Bounds { min, max };
        }
    }

    /// Add a path rule. Ignored for non-path kinds.
    ///
    /// A conflict names the value by its declared path; the context's
    /// [`require_path`](crate::Valfig::require_path) names it with the root
    /// path included.
    pub fn apply_path_rule(&mut self, rule: PathRule) -> Result<(), ValfigError> {
        let name = self.raw_name();
        self.apply_path_rule_as(rule, &name)
    }

    pub(crate) fn apply_path_rule_as(&mut self, rule: PathRule, name: &str) -> Result<(), ValfigError> {
        let Kind::Path(rules) = &mut self.kind else {
            return Ok(());
        };
        rules
            .apply(rule)
            .map_err(|conflict| ValfigError::ConflictingPathRule {
                name: name.to_string(),
                existing: conflict.existing,
                requested: conflict.requested,
            })
    }
}

impl<T: Bounded> Declaration<T> {
    pub fn limits(mut self, min: Option<T>, max: Option<T>) -> Self {
        self.value.set_limits(min, max);
        self
    }
}

impl Declaration<PathBuf> {
    pub fn rule(mut self, rule: PathRule) -> Result<Self, ValfigError> {
        self.value.apply_path_rule(rule)?;
        Ok(self)
    }

    pub fn must_exist(self) -> Self {
        self.infallible(PathRule::MustExist)
    }

    pub fn create_dir(self) -> Self {
        self.infallible(PathRule::CreateDir)
    }

    pub fn must_be_file(self) -> Result<Self, ValfigError> {
        self.rule(PathRule::MustBeFile)
    }

    pub fn must_be_dir(self) -> Result<Self, ValfigError> {
        self.rule(PathRule::MustBeDir)
    }

    fn infallible(mut self, rule: PathRule) -> Self {
        if let Kind::Path(rules) = &mut self.value.kind {
            let _ = rules.apply(rule);
        }
        self
    }
}

impl Declaration<Table> {
    /// Read the value as an array of tables, each checked against the schema.
    pub fn many(self) -> Declaration<Vec<Table>> {
        Declaration {
            value: self.value,
            _marker: PhantomData,
        }
    }
}

/// Typed reference to a value registered in a [`Valfig`](crate::Valfig).
pub struct Handle<T> {
    pub(crate) index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Position of the value in the registry.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.index).finish()
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

/// The output of a successful cast.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Boolean(bool),
    String(String),
    Integer(i64),
    Float(f64),
    Path(PathBuf),
    List(Vec<Value>),
    Table(Table),
    Tables(Vec<Table>),
}

impl Resolved {
    /// The resolved value as TOML, paths rendered as strings.
    pub fn to_value(&self) -> Value {
        match self {
            Resolved::Boolean(b) => Value::Boolean(*b),
            Resolved::String(s) => Value::String(s.clone()),
            Resolved::Integer(i) => Value::Integer(*i),
            Resolved::Float(f) => Value::Float(*f),
            Resolved::Path(p) => Value::String(p.to_string_lossy().into_owned()),
            Resolved::List(items) => Value::Array(items.clone()),
            Resolved::Table(t) => Value::Table(t.clone()),
            Resolved::Tables(ts) => {
                Value::Array(ts.iter().cloned().map(Value::Table).collect())
            }
        }
    }

    fn type_label(&self) -> &'static str {
        match self {
            Resolved::Boolean(_) => "boolean",
            Resolved::String(_) => "string",
            Resolved::Integer(_) => "integer",
            Resolved::Float(_) => "float",
            Resolved::Path(_) => "path",
            Resolved::List(_) => "array",
            Resolved::Table(_) => "table",
            Resolved::Tables(_) => "array of tables",
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::String(s) => f.write_str(s),
            Resolved::Path(p) => write!(f, "{}", p.display()),
            other => write!(f, "{}", other.to_value()),
        }
    }
}

/// Conversion from a cast result into the handle's Rust type.
pub trait FromResolved: Sized {
    fn from_resolved(name: &str, resolved: Resolved) -> Result<Self, ValfigError>;
}

fn unexpected(name: &str, expected: &str, resolved: &Resolved) -> ValfigError {
    ValfigError::TypeMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        actual: resolved.type_label().to_string(),
    }
}

macro_rules! from_resolved {
    ($ty:ty, $variant:ident, $label:literal) => {
        impl FromResolved for $ty {
            fn from_resolved(name: &str, resolved: Resolved) -> Result<Self, ValfigError> {
                match resolved {
                    Resolved::$variant(v) => Ok(v),
                    other => Err(unexpected(name, $label, &other)),
                }
            }
        }
    };
}

from_resolved!(bool, Boolean, "boolean");
from_resolved!(String, String, "string");
from_resolved!(i64, Integer, "integer");
from_resolved!(f64, Float, "float");
from_resolved!(PathBuf, Path, "path");
from_resolved!(Vec<Value>, List, "array");

impl FromResolved for Table {
    fn from_resolved(name: &str, resolved: Resolved) -> Result<Self, ValfigError> {
        match resolved {
            Resolved::Table(t) => Ok(t),
            Resolved::Tables(mut ts) if ts.len() == 1 => Ok(ts.remove(0)),
            other => Err(unexpected(name, "table", &other)),
        }
    }
}

impl FromResolved for Vec<Table> {
    fn from_resolved(name: &str, resolved: Resolved) -> Result<Self, ValfigError> {
        match resolved {
            Resolved::Tables(ts) => Ok(ts),
            Resolved::Table(t) => Ok(vec![t]),
            other => Err(unexpected(name, "array of tables", &other)),
        }
    }
}
