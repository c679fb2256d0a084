//! Reading and writing the TOML config file.
//!
//! The file is treated as a whole: [`ConfigFile::read`] parses everything and
//! callers walk the resulting table. An absent file reads as an empty table.
//!
//! # Errors
//!
//! A parse failure is reported as [`ValfigError::EmptyValue`] when the file
//! holds an assignment with nothing on the right of the `=` (the placeholder
//! left by the generated example), and as [`ValfigError::MalformedFile`]
//! otherwise.
//!
//! # Locking
//!
//! Every read and write holds an exclusive advisory lock on a sidecar
//! `<name>.lock` file. The lock is re-entrant within the process: nested
//! acquisitions for the same file only bump a counter, so a read-then-write
//! sequence can hold it across both steps.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

use fs2::FileExt;
use toml::{Table, Value};

use crate::error::ValfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute location of the file, relative paths resolved against the CWD.
    pub fn absolute_path(&self) -> PathBuf {
        std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone())
    }

    pub fn exists(&self) -> bool {
        self.absolute_path().exists()
    }

    /// Fails with [`ValfigError::FileNotFound`] when the file is absent.
    pub fn ensure_exists(&self) -> Result<(), ValfigError> {
        if self.exists() {
            Ok(())
        } else {
            Err(ValfigError::FileNotFound {
                path: self.path.clone(),
            })
        }
    }

    /// Raw text of the file, `None` if it doesn't exist.
    pub fn read_text(&self) -> Result<Option<String>, ValfigError> {
        let path = self.absolute_path();
        if !path.exists() {
            return Ok(None);
        }
        let _guard = self.lock()?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ValfigError::Io { path, source: e }),
        }
    }

    /// Parse the whole file. An absent file is an empty table.
    pub fn read(&self) -> Result<Table, ValfigError> {
        match self.read_text()? {
            Some(content) => parse_document(&content, &self.path),
            None => Ok(Table::new()),
        }
    }

    /// Serialize `table` and replace the file's content.
    pub fn write(&self, table: &Table) -> Result<(), ValfigError> {
        let text = toml::to_string(table).map_err(|e| ValfigError::Io {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        self.write_text(&text)
    }

    /// Replace the file's content, creating parent directories as needed.
    pub fn write_text(&self, text: &str) -> Result<(), ValfigError> {
        let path = self.absolute_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ValfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let _guard = self.lock()?;
        fs::write(&path, text).map_err(|e| ValfigError::Io { path, source: e })
    }

    /// Acquire the process-wide lock for this file.
    pub fn lock(&self) -> Result<FileLockGuard, ValfigError> {
        FileLockGuard::acquire(self.lock_path())
    }

    /// The sidecar lock file: the full file name with `.lock` appended.
    pub fn lock_path(&self) -> PathBuf {
        let mut name: OsString = self.absolute_path().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }
}

/// Parse TOML text, telling empty values apart from other syntax errors.
pub fn parse_document(content: &str, path: &Path) -> Result<Table, ValfigError> {
    content.parse::<Table>().map_err(|e| match find_empty_value_line(content) {
        Some(line) => ValfigError::EmptyValue {
            path: path.to_path_buf(),
            line,
        },
        None => ValfigError::MalformedFile {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Find the 1-indexed line of the first `key =` with no value.
///
/// Best-effort: comments are stripped, `[section]` headers are skipped and
/// the bodies of multi-line strings are ignored.
fn find_empty_value_line(content: &str) -> Option<usize> {
    let mut in_multiline: Option<&str> = None;

    for (i, line) in content.lines().enumerate() {
        if let Some(delim) = in_multiline {
            if line.matches(delim).count() % 2 == 1 {
                in_multiline = None;
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('[') {
            continue;
        }

        for delim in ["\"\"\"", "'''"] {
            if trimmed.matches(delim).count() % 2 == 1 {
                in_multiline = Some(delim);
            }
        }
        if in_multiline.is_some() {
            continue;
        }

        let Some((key, rest)) = trimmed.split_once('=') else {
            continue;
        };
        let rest = rest.split('#').next().unwrap_or_default().trim();
        if !key.trim().is_empty() && rest.is_empty() {
            return Some(i + 1);
        }
    }
    None
}

/// Walk `table` along `segments`. A missing key, or a non-table in the middle
/// of the walk, is "not found".
pub fn table_get<'a, S: AsRef<str>>(table: &'a Table, segments: &[S]) -> Option<&'a Value> {
    let (leaf, parents) = segments.split_last()?;
    let mut current = table;
    for segment in parents {
        current = current.get(segment.as_ref())?.as_table()?;
    }
    current.get(leaf.as_ref())
}

struct HeldLock {
    file: File,
    depth: usize,
}

static HELD_LOCKS: LazyLock<Mutex<HashMap<PathBuf, HeldLock>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Releases one level of the re-entrant file lock when dropped.
#[derive(Debug)]
pub struct FileLockGuard {
    lock_path: PathBuf,
}

impl FileLockGuard {
    fn acquire(lock_path: PathBuf) -> Result<Self, ValfigError> {
        let mut held = HELD_LOCKS.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = held.get_mut(&lock_path) {
            existing.depth += 1;
            return Ok(Self { lock_path });
        }

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ValfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = File::create(&lock_path).map_err(|e| ValfigError::Io {
            path: lock_path.clone(),
            source: e,
        })?;
        file.lock_exclusive().map_err(|e| ValfigError::Io {
            path: lock_path.clone(),
            source: e,
        })?;

        held.insert(lock_path.clone(), HeldLock { file, depth: 1 });
        Ok(Self { lock_path })
    }

    /// Number of nested holders of this lock in the process.
    pub fn depth(&self) -> usize {
        let held = HELD_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
        held.get(&self.lock_path).map_or(0, |h| h.depth)
    }
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        let mut held = HELD_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
        let release = match held.get_mut(&self.lock_path) {
            Some(existing) => {
                existing.depth -= 1;
                existing.depth == 0
            }
            None => false,
        };
        if release && let Some(existing) = held.remove(&self.lock_path) {
            let _ = FileExt::unlock(&existing.file);
        }
    }
}
