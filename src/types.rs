use std::fmt;
use std::path::PathBuf;

use toml::Value;

/// The type of a TOML node, named the way users read it in errors and
/// generated documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Boolean,
    String,
    Integer,
    Float,
    Datetime,
    Array,
    Table,
}

impl ValueType {
    /// The type of a concrete value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Boolean(_) => ValueType::Boolean,
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Datetime(_) => ValueType::Datetime,
            Value::Array(_) => ValueType::Array,
            Value::Table(_) => ValueType::Table,
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        ValueType::of(value) == self
    }

    pub fn friendly_name(self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Datetime => "datetime",
            ValueType::Array => "array",
            ValueType::Table => "table",
        }
    }

    /// A placeholder of this type, used in generated examples.
    pub fn sample(self) -> Value {
        match self {
            ValueType::Boolean => Value::Boolean(true),
            ValueType::String => Value::String("some text".into()),
            ValueType::Integer => Value::Integer(1),
            ValueType::Float => Value::Float(1.0),
            ValueType::Datetime => "1979-05-27T07:32:00Z"
                .parse()
                .map(Value::Datetime)
                .unwrap_or_else(|_| Value::String("1979-05-27T07:32:00Z".into())),
            ValueType::Array => Value::Array(Vec::new()),
            ValueType::Table => Value::Table(toml::Table::new()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.friendly_name())
    }
}

/// Friendly type name of a concrete value.
pub fn friendly_type_name(value: &Value) -> &'static str {
    ValueType::of(value).friendly_name()
}

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Resolve every declared value and show it.
    List,
    /// Generate the example config file.
    Gen { output: Option<PathBuf> },
    /// Show one value by its dotted name.
    Get { name: String },
    /// Persist a raw value into the config file.
    Set { name: String, value: String },
    /// Remove a value from the config file.
    Unset { name: String },
    /// Run the validator.
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_every_toml_type() {
        assert_eq!(friendly_type_name(&Value::Boolean(true)), "boolean");
        assert_eq!(friendly_type_name(&Value::String("x".into())), "string");
        assert_eq!(friendly_type_name(&Value::Integer(1)), "integer");
        assert_eq!(friendly_type_name(&Value::Float(1.5)), "float");
        assert_eq!(friendly_type_name(&Value::Array(vec![])), "array");
        assert_eq!(
            friendly_type_name(&Value::Table(toml::Table::new())),
            "table"
        );
    }

    #[test]
    fn integer_does_not_match_float_or_bool() {
        assert!(ValueType::Integer.matches(&Value::Integer(3)));
        assert!(!ValueType::Integer.matches(&Value::Float(3.0)));
        assert!(!ValueType::Integer.matches(&Value::Boolean(true)));
    }

    #[test]
    fn samples_have_their_own_type() {
        for ty in [
            ValueType::Boolean,
            ValueType::String,
            ValueType::Integer,
            ValueType::Float,
            ValueType::Datetime,
            ValueType::Array,
            ValueType::Table,
        ] {
            assert!(ty.matches(&ty.sample()), "{ty}");
        }
    }
}
