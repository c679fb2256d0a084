//! Per-kind casting rules.
//!
//! Each [`Kind`] variant names its type, says how an environment string is
//! coerced before casting, and turns a raw TOML value into a [`Resolved`] one
//! or fails with an error naming the value.

use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::env::Coercion;
use crate::error::ValfigError;
use crate::types::friendly_type_name;
use crate::value::{Kind, PathRules, Resolved, TableKey};

impl Kind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Kind::Boolean => "boolean",
            Kind::String => "string",
            Kind::Integer(_) => "integer",
            Kind::Float(_) => "float",
            Kind::Path(_) => "path",
            Kind::List(_) => "array",
            Kind::TableArray(_) => "array of tables",
        }
    }

    /// Type label used in mismatch errors.
    pub fn expected_label(&self) -> String {
        match self {
            Kind::List(element) => format!("array of {element}s"),
            other => other.type_name().to_string(),
        }
    }

    /// Type label with active constraints, e.g.
    /// `path (must be a file, must already exist)`.
    pub fn documented_type(&self) -> String {
        let constraints = match self {
            Kind::Integer(bounds) => bounds.describe(),
            Kind::Float(bounds) => bounds.describe(),
            Kind::Path(rules) => {
                let rules = rules.describe();
                (!rules.is_empty()).then(|| rules.join(", "))
            }
            _ => None,
        };
        match constraints {
            Some(c) => format!("{} ({c})", self.expected_label()),
            None => self.expected_label(),
        }
    }

    /// How an environment string is read. Only booleans interpret it; every
    /// other kind receives the string as is and casts it like a string found
    /// in the file.
    pub fn env_coercion(&self) -> Coercion {
        match self {
            Kind::Boolean => Coercion::Boolean,
            _ => Coercion::Verbatim,
        }
    }

    /// How a value typed on the command line (`config set`) is read before
    /// it is cast and written to the file.
    pub fn input_coercion(&self) -> Coercion {
        match self {
            Kind::Boolean => Coercion::Boolean,
            Kind::String | Kind::Path(_) => Coercion::Verbatim,
            Kind::Integer(_) => Coercion::Integer,
            Kind::Float(_) => Coercion::Float,
            Kind::List(_) | Kind::TableArray(_) => Coercion::Inline,
        }
    }

    pub fn cast(&self, name: &str, raw: Value) -> Result<Resolved, ValfigError> {
        match (self, raw) {
            (Kind::Boolean, Value::Boolean(b)) => Ok(Resolved::Boolean(b)),
            (Kind::String, Value::String(s)) => Ok(Resolved::String(s)),
            (Kind::Integer(bounds), Value::Integer(i)) => {
                bounds.check(name, i).map(Resolved::Integer)
            }
            (Kind::Float(bounds), Value::Float(f)) => bounds.check(name, f).map(Resolved::Float),
            (Kind::Path(rules), Value::String(s)) => cast_path(name, rules, Path::new(&s)),
            (Kind::List(element), Value::Array(items)) => {
                if let Some((index, item)) = items
                    .iter()
                    .enumerate()
                    .find(|(_, item)| !element.matches(item))
                {
                    return Err(ValfigError::ListElementType {
                        name: name.to_string(),
                        index,
                        expected: element.to_string(),
                        actual: friendly_type_name(item).to_string(),
                    });
                }
                Ok(Resolved::List(items))
            }
            (Kind::TableArray(keys), Value::Table(table)) => {
                check_keys(name, keys, table).map(Resolved::Table)
            }
            (Kind::TableArray(keys), Value::Array(items))
                if items.iter().all(|item| item.is_table()) =>
            {
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Table(table) => Some(table),
                        _ => None,
                    })
                    .map(|table| check_keys(name, keys, table))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Resolved::Tables)
            }
            (kind, other) => Err(ValfigError::TypeMismatch {
                name: name.to_string(),
                expected: kind.expected_label(),
                actual: friendly_type_name(&other).to_string(),
            }),
        }
    }
}

fn cast_path(name: &str, rules: &PathRules, path: &Path) -> Result<Resolved, ValfigError> {
    let exists = path.exists();
    if rules.must_exist && !exists {
        return Err(ValfigError::PathMustExist {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }
    if exists && rules.must_be_dir && !path.is_dir() {
        return Err(ValfigError::NotADirectory {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }
    if exists && rules.must_be_file && !path.is_file() {
        return Err(ValfigError::NotAFile {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }
    if !exists && rules.create_dir {
        std::fs::create_dir_all(path).map_err(|e| ValfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!("{name}: created directory {}", path.display());
    }
    let absolute: PathBuf = std::path::absolute(path).map_err(|e| ValfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Resolved::Path(absolute))
}

/// Fill key defaults and type-check every declared key. Undeclared keys pass
/// through untouched.
fn check_keys(name: &str, keys: &[TableKey], mut table: Table) -> Result<Table, ValfigError> {
    for key in keys {
        if !table.contains_key(&key.key_name) {
            match &key.default {
                Some(default) => {
                    table.insert(key.key_name.clone(), default.clone());
                }
                None => {
                    return Err(ValfigError::MissingTableKey {
                        name: name.to_string(),
                        key: key.key_name.clone(),
                    });
                }
            }
        }
        let value = &table[&key.key_name];
        if !key.key_type.matches(value) {
            return Err(ValfigError::TableKeyType {
                name: name.to_string(),
                key: key.key_name.clone(),
                expected: key.key_type.to_string(),
                actual: friendly_type_name(value).to_string(),
            });
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;
    use crate::value::Bounds;
    use tempfile::TempDir;

    fn s(v: &str) -> Value {
        Value::String(v.into())
    }

    fn table(text: &str) -> Table {
        text.parse().unwrap()
    }

    #[test]
    fn boolean_accepts_native_only() {
        assert_eq!(
            Kind::Boolean.cast("b", Value::Boolean(false)).unwrap(),
            Resolved::Boolean(false)
        );
        for (raw, actual) in [
            (Value::Integer(10), "integer"),
            (s("true"), "string"),
            (Value::Array(vec![s("x")]), "array"),
        ] {
            match Kind::Boolean.cast("b", raw).unwrap_err() {
                ValfigError::TypeMismatch {
                    expected, actual: a, ..
                } => {
                    assert_eq!(expected, "boolean");
                    assert_eq!(a, actual);
                }
                other => panic!("Expected TypeMismatch, got: {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_boolean_message() {
        let err = Kind::Boolean.cast("key", s("yes")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "key: config value must be of type \"boolean\", got \"string\" instead; use either true or false, without quotes"
        );
    }

    #[test]
    fn string_rejects_non_strings() {
        let err = Kind::String.cast("k", Value::Integer(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "k: config value must be of type \"string\", got \"integer\" instead"
        );
    }

    #[test]
    fn integer_rejects_float_string_and_bool() {
        let kind = Kind::Integer(Bounds::default());
        for (raw, actual) in [
            (Value::Float(1.0), "float"),
            (s("10"), "string"),
            (Value::Boolean(true), "boolean"),
        ] {
            match kind.cast("i", raw).unwrap_err() {
                ValfigError::TypeMismatch { actual: a, .. } => assert_eq!(a, actual),
                other => panic!("Expected TypeMismatch, got: {other:?}"),
            }
        }
    }

    #[test]
    fn integer_bounds_min_equals_max() {
        let kind = Kind::Integer(Bounds {
            min: Some(10),
            max: Some(10),
        });
        assert_eq!(
            kind.cast("i", Value::Integer(10)).unwrap(),
            Resolved::Integer(10)
        );
        for v in [9, 11] {
            let err = kind.cast("i", Value::Integer(v)).unwrap_err();
            assert!(matches!(err, ValfigError::OutOfBound { .. }), "{v}");
        }
    }

    #[test]
    fn integer_zero_bound_is_enforced() {
        let kind = Kind::Integer(Bounds {
            min: Some(0),
            max: None,
        });
        assert!(kind.cast("i", Value::Integer(-1)).is_err());
    }

    #[test]
    fn float_rejects_integer() {
        let kind = Kind::Float(Bounds::default());
        assert!(matches!(
            kind.cast("f", Value::Integer(10)).unwrap_err(),
            ValfigError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn float_bounds() {
        let kind = Kind::Float(Bounds {
            min: Some(10.0),
            max: Some(10.0),
        });
        assert!(kind.cast("f", Value::Float(10.0)).is_ok());
        assert!(kind.cast("f", Value::Float(9.0)).is_err());
        assert!(kind.cast("f", Value::Float(11.0)).is_err());
    }

    #[test]
    fn list_reports_first_bad_index() {
        let kind = Kind::List(ValueType::String);
        let err = kind
            .cast("l", Value::Array(vec![s("a"), Value::Integer(1), s("b")]))
            .unwrap_err();
        match &err {
            ValfigError::ListElementType { index, actual, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(actual, "integer");
            }
            other => panic!("Expected ListElementType, got: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "l: item at index 1 should be a \"string\", but is \"integer\" instead"
        );
    }

    #[test]
    fn list_rejects_non_array() {
        let err = Kind::List(ValueType::String)
            .cast("l", Value::Integer(10))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "l: config value must be of type \"array of strings\", got \"integer\" instead"
        );
    }

    #[test]
    fn table_passes_undeclared_keys_through() {
        let kind = Kind::TableArray(vec![TableKey::new("key1", ValueType::String, "desc")]);
        let raw = table("key1 = \"value1\"\nkey2 = \"other\"\n");
        assert_eq!(
            kind.cast("t", Value::Table(raw.clone())).unwrap(),
            Resolved::Table(raw)
        );
    }

    #[test]
    fn table_missing_mandatory_key() {
        let kind = Kind::TableArray(vec![TableKey::new("missing", ValueType::String, "desc")]);
        let err = kind
            .cast("t", Value::Table(table("key1 = \"value1\"")))
            .unwrap_err();
        assert!(matches!(err, ValfigError::MissingTableKey { .. }));
    }

    #[test]
    fn table_missing_optional_key_gets_default() {
        let kind = Kind::TableArray(vec![
            TableKey::new("opt", ValueType::String, "desc").default("default"),
        ]);
        let resolved = kind.cast("t", Value::Table(Table::new())).unwrap();
        assert_eq!(resolved, Resolved::Table(table("opt = \"default\"")));
    }

    #[test]
    fn table_key_wrong_type() {
        let kind = Kind::TableArray(vec![TableKey::new("key1", ValueType::Integer, "desc")]);
        let err = kind
            .cast("t", Value::Table(table("key1 = \"value1\"")))
            .unwrap_err();
        match err {
            ValfigError::TableKeyType {
                expected, actual, ..
            } => {
                assert_eq!(expected, "integer");
                assert_eq!(actual, "string");
            }
            other => panic!("Expected TableKeyType, got: {other:?}"),
        }
    }

    #[test]
    fn table_rejects_non_table() {
        let kind = Kind::TableArray(vec![]);
        let err = kind.cast("t", s("test")).unwrap_err();
        assert!(matches!(err, ValfigError::TypeMismatch { .. }));
    }

    #[test]
    fn array_of_tables_checks_each_element() {
        let kind = Kind::TableArray(vec![TableKey::new("name", ValueType::String, "desc")]);
        let doc = table("[[srv]]\nname = \"a\"\n[[srv]]\nname = \"b\"\n");
        let resolved = kind.cast("t", doc["srv"].clone()).unwrap();
        match resolved {
            Resolved::Tables(tables) => assert_eq!(tables.len(), 2),
            other => panic!("Expected Tables, got: {other:?}"),
        }

        let bad = table("[[srv]]\nname = \"a\"\n[[srv]]\nother = 1\n");
        assert!(matches!(
            kind.cast("t", bad["srv"].clone()).unwrap_err(),
            ValfigError::MissingTableKey { .. }
        ));
    }

    #[test]
    fn path_is_made_absolute() {
        let kind = Kind::Path(PathRules::default());
        match kind.cast("p", s("some path")).unwrap() {
            Resolved::Path(p) => {
                assert!(p.is_absolute());
                assert!(p.ends_with("some path"));
            }
            other => panic!("Expected Path, got: {other:?}"),
        }
    }

    #[test]
    fn path_rejects_non_string() {
        let kind = Kind::Path(PathRules::default());
        for raw in [Value::Integer(10), Value::Array(vec![s("some")])] {
            assert!(matches!(
                kind.cast("p", raw).unwrap_err(),
                ValfigError::TypeMismatch { .. }
            ));
        }
    }

    #[test]
    fn path_must_exist() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("some path");
        let raw = s(target.to_str().unwrap());
        let kind = Kind::Path(PathRules {
            must_exist: true,
            ..PathRules::default()
        });
        assert!(matches!(
            kind.cast("p", raw.clone()).unwrap_err(),
            ValfigError::PathMustExist { .. }
        ));
        std::fs::write(&target, "").unwrap();
        assert!(kind.cast("p", raw).is_ok());
    }

    #[test]
    fn path_must_be_file_with_dir() {
        let dir = TempDir::new().unwrap();
        let kind = Kind::Path(PathRules {
            must_be_file: true,
            ..PathRules::default()
        });
        let err = kind
            .cast("p", s(dir.path().to_str().unwrap()))
            .unwrap_err();
        assert!(matches!(err, ValfigError::NotAFile { .. }));
    }

    #[test]
    fn path_must_be_dir_with_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();
        let kind = Kind::Path(PathRules {
            must_be_dir: true,
            ..PathRules::default()
        });
        let err = kind.cast("p", s(file.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, ValfigError::NotADirectory { .. }));
    }

    #[test]
    fn path_file_rule_ignored_when_absent() {
        let dir = TempDir::new().unwrap();
        let kind = Kind::Path(PathRules {
            must_be_file: true,
            ..PathRules::default()
        });
        let missing = dir.path().join("nope");
        assert!(kind.cast("p", s(missing.to_str().unwrap())).is_ok());
    }

    #[test]
    fn path_create_missing_dir() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("some path");
        let kind = Kind::Path(PathRules {
            create_dir: true,
            ..PathRules::default()
        });
        assert!(!target.exists());
        kind.cast("p", s(target.to_str().unwrap())).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn documented_type_lists_constraints() {
        let kind = Kind::Path(PathRules {
            must_be_file: true,
            must_exist: true,
            ..PathRules::default()
        });
        assert_eq!(
            kind.documented_type(),
            "path (must be a file, must already exist)"
        );
        let kind = Kind::Integer(Bounds {
            min: Some(1),
            max: Some(10),
        });
        assert_eq!(kind.documented_type(), "integer (min: 1, max: 10)");
        assert_eq!(Kind::List(ValueType::Float).documented_type(), "array of floats");
    }
}
