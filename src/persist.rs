//! Config persistence: patch values into the TOML file while preserving formatting.
//!
//! Uses `toml_edit` for comment-preserving edits. When no file exists yet,
//! starts from a seed document (the documented example body) so the new file
//! describes every value. Reads and writes happen under the file lock.

use std::path::Path;

use toml_edit::{DocumentMut, Item};

use crate::error::ValfigError;
use crate::file::{ConfigFile, parse_document};
use crate::ops::{ConfigResult, format_value};

/// Pure function: patch a TOML document string, setting the value at
/// `segments`. Intermediate tables are created as needed.
///
/// Returns the modified document string.
pub fn set_in_document(
    content: &str,
    path: &Path,
    segments: &[String],
    value: &toml::Value,
) -> Result<String, ValfigError> {
    let mut doc = parse_editable(content, path)?;
    let dotted = segments.join(".");
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(ValfigError::EmptyPath);
    };

    let new_value: toml_edit::Value =
        value
            .to_string()
            .parse()
            .map_err(|e: toml_edit::TomlError| ValfigError::Deserialize {
                name: dotted.clone(),
                reason: e.to_string(),
            })?;

    let mut current: &mut Item = doc.as_item_mut();
    for segment in parents {
        match current.get(segment.as_str()) {
            None => current[segment.as_str()] = Item::Table(toml_edit::Table::new()),
            Some(item) if item.is_table_like() => {}
            Some(_) => {
                return Err(ValfigError::Deserialize {
                    name: dotted,
                    reason: format!("\"{segment}\" is not a table in {}", path.display()),
                });
            }
        }
        current = &mut current[segment.as_str()];
    }
    current[leaf.as_str()] = toml_edit::value(new_value);

    Ok(doc.to_string())
}

/// Pure function: remove the value at `segments`. `Ok(None)` when the key is
/// not in the document.
pub fn unset_in_document(
    content: &str,
    path: &Path,
    segments: &[String],
) -> Result<Option<String>, ValfigError> {
    let mut doc = parse_editable(content, path)?;
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(ValfigError::EmptyPath);
    };

    let mut current: &mut Item = doc.as_item_mut();
    for segment in parents {
        match current.get_mut(segment.as_str()) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    let removed = current
        .as_table_like_mut()
        .and_then(|table| table.remove(leaf));
    Ok(removed.map(|_| doc.to_string()))
}

/// I/O wrapper: reads the file (or the seed), patches it, writes it back.
pub fn persist_value<F>(
    file: &ConfigFile,
    seed: F,
    name: &str,
    segments: &[String],
    value: &toml::Value,
) -> Result<ConfigResult, ValfigError>
where
    F: FnOnce() -> String,
{
    let _guard = file.lock()?;
    let content = match file.read_text()? {
        Some(content) => content,
        None => {
            tracing::info!("{}: creating config file", file.path().display());
            seed()
        }
    };

    let updated = set_in_document(&content, file.path(), segments, value)?;
    file.write_text(&updated)?;
    tracing::debug!("{name}: written to {}", file.path().display());

    Ok(ConfigResult::ValueSet {
        name: name.to_string(),
        value: format_value(value),
    })
}

/// I/O wrapper: removes the value from the file if present. A missing file or
/// key is not an error.
pub fn unset_value(
    file: &ConfigFile,
    name: &str,
    segments: &[String],
) -> Result<ConfigResult, ValfigError> {
    let _guard = file.lock()?;
    if let Some(content) = file.read_text()?
        && let Some(updated) = unset_in_document(&content, file.path(), segments)?
    {
        file.write_text(&updated)?;
        tracing::debug!("{name}: removed from {}", file.path().display());
    }
    Ok(ConfigResult::ValueUnset {
        name: name.to_string(),
    })
}

fn parse_editable(content: &str, path: &Path) -> Result<DocumentMut, ValfigError> {
    content.parse::<DocumentMut>().map_err(|e| {
        // Prefer the reader's diagnosis (empty value with its line, or malformed).
        match parse_document(content, path) {
            Err(err) => err,
            Ok(_) => ValfigError::Deserialize {
                name: path.display().to_string(),
                reason: e.to_string(),
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use toml::Value;

    fn segs(path: &[&str]) -> Vec<String> {
        path.iter().map(|s| s.to_string()).collect()
    }

    fn path() -> &'static Path {
        Path::new("config.toml")
    }

    #[test]
    fn set_existing_key() {
        let content = "port = 8080\nhost = \"localhost\"\n";
        let result =
            set_in_document(content, path(), &segs(&["port"]), &Value::Integer(3000)).unwrap();
        assert!(result.contains("port = 3000"));
        assert!(result.contains("host = \"localhost\""));
    }

    #[test]
    fn set_nested_key() {
        let content = "[database]\npool_size = 5\n";
        let result = set_in_document(
            content,
            path(),
            &segs(&["database", "pool_size"]),
            &Value::Integer(20),
        )
        .unwrap();
        assert!(result.contains("pool_size = 20"));
    }

    #[test]
    fn set_creates_intermediate_tables() {
        let result =
            set_in_document("", path(), &segs(&["a", "b"]), &Value::String("x".into())).unwrap();
        let table: toml::Table = result.parse().unwrap();
        assert_eq!(table["a"]["b"].as_str(), Some("x"));
    }

    #[test]
    fn set_through_non_table_fails() {
        let err =
            set_in_document("a = 1\n", path(), &segs(&["a", "b"]), &Value::Integer(2)).unwrap_err();
        assert!(matches!(err, ValfigError::Deserialize { .. }));
    }

    #[test]
    fn set_list_value() {
        let list = Value::Array(vec![Value::String("a".into()), Value::String("b".into())]);
        let result = set_in_document("", path(), &segs(&["names"]), &list).unwrap();
        assert!(result.contains("names = [\"a\", \"b\"]"));
    }

    #[test]
    fn preserves_comments() {
        let content = "# This is my config\nport = 8080\n# end\n";
        let result =
            set_in_document(content, path(), &segs(&["port"]), &Value::Integer(3000)).unwrap();
        assert!(result.contains("# This is my config"));
        assert!(result.contains("port = 3000"));
    }

    #[test]
    fn empty_value_in_file_reported() {
        let err = set_in_document("key = \n", path(), &segs(&["other"]), &Value::Integer(1))
            .unwrap_err();
        assert!(matches!(err, ValfigError::EmptyValue { line: 1, .. }));
    }

    #[test]
    fn unset_removes_nested_key() {
        let content = "[db]\nurl = \"x\"\npool = 5\n";
        let result = unset_in_document(content, path(), &segs(&["db", "url"]))
            .unwrap()
            .unwrap();
        assert!(!result.contains("url"));
        assert!(result.contains("pool = 5"));
    }

    #[test]
    fn unset_missing_key_is_none() {
        assert_eq!(
            unset_in_document("a = 1\n", path(), &segs(&["b", "c"])).unwrap(),
            None
        );
        assert_eq!(
            unset_in_document("a = 1\n", path(), &segs(&["b"])).unwrap(),
            None
        );
    }

    #[test]
    fn persist_creates_file_from_seed() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::new(dir.path().join("sub").join("config.toml"));

        let result = persist_value(
            &file,
            || "# seeded\n".to_string(),
            "port",
            &segs(&["port"]),
            &Value::Integer(3000),
        )
        .unwrap();
        assert!(matches!(result, ConfigResult::ValueSet { .. }));

        let content = fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("# seeded\n"));
        assert!(content.contains("port = 3000"));
    }

    #[test]
    fn persist_modifies_existing() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::new(dir.path().join("config.toml"));
        fs::write(file.path(), "port = 8080\n").unwrap();

        persist_value(
            &file,
            || panic!("seed must not be used for an existing file"),
            "port",
            &segs(&["port"]),
            &Value::Integer(3000),
        )
        .unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("port = 3000"));
        assert!(!content.contains("8080"));
    }

    #[test]
    fn unset_value_without_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::new(dir.path().join("config.toml"));
        let result = unset_value(&file, "port", &segs(&["port"])).unwrap();
        assert_eq!(
            result,
            ConfigResult::ValueUnset {
                name: "port".into()
            }
        );
        assert!(!file.exists());
    }
}
