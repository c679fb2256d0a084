//! Declared, typed configuration values for Rust applications.
//!
//! An application declares each configuration value it needs (a path, a
//! type, a description and optionally a default) and reads it through a typed
//! handle. Every read resolves the value on the spot from, in order:
//!
//! ```text
//! Environment variable   UPPER(app_name + sep + path)
//!        ↓ not set
//! Config file            TOML, walked along the path
//!        ↓ not set
//! Declared default
//!        ↓ none
//! MissingValue error
//! ```
//!
//! ```ignore
//! let mut valfig = Valfig::builder()
//!     .app_name("myapp")
//!     .app_version("1.0")
//!     .config_file("myapp.toml")
//!     .build();
//!
//! let port = valfig.declare(
//!     ConfigValue::integer(["server", "port"], "Port to listen on")
//!         .default(8080)
//!         .limits(Some(1), Some(65535)),
//! )?;
//!
//! let port: i64 = valfig.get(&port)?;
//! ```
//!
//! # Declaring values
//!
//! [`ConfigValue`] has one constructor per supported type: `boolean`,
//! `string`, `integer`, `float`, `path`, `list` (with an element type) and
//! `table_array` (with a key schema). Each returns a [`Declaration`] typed by
//! what the value resolves to, so [`Valfig::get`] hands back a `bool`, an
//! `i64`, a `PathBuf`, a `toml::Table`... without any conversion at the call
//! site. [`Valfig::get_as`] deserializes any value into a serde type.
//!
//! A value without a default is mandatory. [`Declaration::optional`] makes it
//! legal for a value to be set nowhere; [`Valfig::get_opt`] then returns
//! `None`.
//!
//! # Type checks
//!
//! Casting is strict. An integer never accepts a float, a string never
//! accepts a number, and a boolean in the config file must be a TOML boolean.
//! Environment variables are strings and are cast like a string found in the
//! file, with one exception: the exact values `true` and `false` set a
//! boolean. An integer, float, list or table value can therefore only come
//! from the file or the default.
//!
//! Integers and floats take inclusive bounds. Paths are returned absolute and
//! can be required to exist, to be a file or a directory, or be created as a
//! directory when missing. Lists check every element; tables check every
//! declared key, fill key defaults and let undeclared keys through.
//!
//! # Validation
//!
//! [`Valfig::validate`] resolves every declared value once. It reports values
//! declared twice for the same path and every mandatory value with no source,
//! in one go, so a misconfigured application can tell the user everything
//! that is wrong at startup. [`Valfig::unknown_keys`] lists the keys of the
//! config file that no declared value reads.
//!
//! # Example config file
//!
//! [`Valfig::write_example`] renders every declared value as documented TOML:
//! its description, type and constraints, the default (commented out) or an
//! empty placeholder for mandatory values. The file starts with a header
//! explaining how values are found.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) offers
//! [`ConfigArgs`], a clap derive struct giving your app
//! `config gen|list|get|set|unset|check` subcommands. It converts to a
//! framework-agnostic [`ConfigAction`] handled by [`Valfig::handle`]. To use
//! valfig without clap:
//!
//! ```toml
//! valfig = { version = "...", default-features = false }
//! ```
//!
//! `config set` edits the file with `toml_edit`, so comments and formatting
//! survive. The value is read as TOML for its declared type (`3000`,
//! `["a", "b"]`, `{ key = 1 }`) and cast before anything is written.
//!
//! # Logging
//!
//! The crate logs through `tracing`: the source each value resolved from at
//! `debug`, unknown file keys and duplicate declarations at `warn`. Install a
//! subscriber to see them.
//!
//! # Error handling
//!
//! All fallible operations return [`ValfigError`]. Value errors name the
//! value; type errors state the expected and the actual type.

pub mod error;
pub mod types;

mod builder;
mod cast;
#[cfg(feature = "clap")]
mod cli;
pub mod env;
pub mod example;
pub mod file;
mod ops;
mod persist;
pub mod resolve;
pub mod setup;
pub mod validate;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use builder::{Valfig, ValfigBuilder};
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use env::EnvSource;
pub use error::ValfigError;
pub use file::ConfigFile;
pub use ops::ConfigResult;
pub use setup::Setup;
pub use types::{ConfigAction, ValueType};
pub use validate::{UnknownKey, ValidationReport};
pub use value::{
    Bounds, ConfigValue, Declaration, Fallback, Handle, Kind, PathRule, PathRules, Resolved,
    TableKey,
};
