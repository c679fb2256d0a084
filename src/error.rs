use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValfigError {
    #[error("valfig setup is incomplete; missing: {}", missing.join(", "))]
    IncompleteSetup { missing: Vec<&'static str> },

    #[error("{}: file not found", path.display())]
    FileNotFound { path: PathBuf },

    #[error(
        "{}: config file could not be decoded; see https://toml.io for the TOML specification: {source}",
        path.display()
    )]
    MalformedFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(
        "{}: empty value found at line {line}; look for an equal sign (\"=\") with no value to its right",
        path.display()
    )]
    EmptyValue { path: PathBuf, line: usize },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{name}: missing config value")]
    MissingValue { name: String },

    #[error(
        "{name}: config value must be of type \"{expected}\", got \"{actual}\" instead{}",
        type_hint(expected)
    )]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("{name}: item at index {index} should be a \"{expected}\", but is \"{actual}\" instead")]
    ListElementType {
        name: String,
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("{name}: value {value} is out of bounds (min: {min}, max: {max})")]
    OutOfBound {
        name: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("{name}: file/folder not found: {}", path.display())]
    PathMustExist { name: String, path: PathBuf },

    #[error("{name}: not a file: {}", path.display())]
    NotAFile { name: String, path: PathBuf },

    #[error("{name}: not a folder: {}", path.display())]
    NotADirectory { name: String, path: PathBuf },

    #[error("{name}: cannot require a {requested}, the path is already required to be a {existing}")]
    ConflictingPathRule {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("duplicate config values: {}", names.join(", "))]
    DuplicatePaths { names: Vec<String> },

    #[error("missing config values: {}", names.join(", "))]
    MissingValues { names: Vec<String> },

    #[error("config validation failed: {}", join_errors(.0))]
    Validation(Vec<ValfigError>),

    #[error("{name}: missing key \"{key}\" in table")]
    MissingTableKey { name: String, key: String },

    #[error("{name}: key \"{key}\" should be a \"{expected}\", but is \"{actual}\" instead")]
    TableKeyType {
        name: String,
        key: String,
        expected: String,
        actual: String,
    },

    #[error("{name}: table has no key \"{key}\"")]
    UnknownTableKey { name: String, key: String },

    #[error("Unknown config value: {0}")]
    UnknownValue(String),

    #[error("A config value needs at least one path segment")]
    EmptyPath,

    #[error("{name}: invalid default: {reason}")]
    InvalidDefault { name: String, reason: String },

    #[error("{name}: {reason}")]
    Deserialize { name: String, reason: String },
}

fn type_hint(expected: &str) -> &'static str {
    match expected {
        "boolean" => "; use either true or false, without quotes",
        _ => "",
    }
}

fn join_errors(errors: &[ValfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
