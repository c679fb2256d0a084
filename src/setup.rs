//! Application identity and the config file location.
//!
//! Every value resolution starts with [`Setup::check`]: the app name, version,
//! config file path and path separator must all be set.

use std::path::{Path, PathBuf};

use crate::error::ValfigError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Setup {
    app_version: Option<String>,
    app_name: Option<String>,
    config_file_path: Option<PathBuf>,
    separator: Option<String>,
    root_path: Vec<String>,
}

impl Setup {
    /// A complete setup in one call.
    pub fn new(
        app_version: &str,
        app_name: &str,
        config_file_path: impl Into<PathBuf>,
        separator: &str,
    ) -> Self {
        Self {
            app_version: Some(app_version.to_string()),
            app_name: Some(app_name.to_string()),
            config_file_path: Some(config_file_path.into()),
            separator: Some(separator.to_string()),
            root_path: Vec::new(),
        }
    }

    /// Segments prepended to the path of every declared value.
    pub fn root_path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_path = segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_app_version(&mut self, version: &str) {
        self.app_version = Some(version.to_string());
    }

    pub fn set_app_name(&mut self, name: &str) {
        self.app_name = Some(name.to_string());
    }

    pub fn set_config_file_path(&mut self, path: impl Into<PathBuf>) {
        self.config_file_path = Some(path.into());
    }

    pub fn set_separator(&mut self, separator: &str) {
        self.separator = Some(separator.to_string());
    }

    pub fn set_root_path(&mut self, segments: Vec<String>) {
        self.root_path = segments;
    }

    /// Fails naming every required field that is still unset.
    pub fn check(&self) -> Result<(), ValfigError> {
        let mut missing = Vec::new();
        if self.app_version.is_none() {
            missing.push("app_version");
        }
        if self.app_name.is_none() {
            missing.push("app_name");
        }
        if self.config_file_path.is_none() {
            missing.push("config_file_path");
        }
        if self.separator.is_none() {
            missing.push("config_sep_str");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValfigError::IncompleteSetup { missing })
        }
    }

    pub fn app_version(&self) -> &str {
        self.app_version.as_deref().unwrap_or_default()
    }

    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or_default()
    }

    pub fn config_file_path(&self) -> &Path {
        self.config_file_path.as_deref().unwrap_or(Path::new(""))
    }

    pub fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or_default()
    }

    pub fn root_segments(&self) -> &[String] {
        &self.root_path
    }

    /// Join root and value segments into the separator-delimited path.
    pub fn join_path(&self, raw_path: &[String]) -> String {
        let sep = self.separator();
        let raw = raw_path.join(sep);
        if self.root_path.is_empty() {
            raw
        } else {
            format!("{}{sep}{raw}", self.root_path.join(sep))
        }
    }

    /// Human-readable dotted form of a separator-delimited path.
    pub fn dotted(&self, path: &str) -> String {
        let sep = self.separator();
        if sep.is_empty() {
            return path.to_string();
        }
        path.split(sep).collect::<Vec<_>>().join(".")
    }

    /// Environment variable that overrides the value at `path`.
    pub fn env_var_name(&self, path: &str) -> String {
        format!("{}{}{path}", self.app_name(), self.separator()).to_uppercase()
    }
}

/// `{platform config dir}/{file_name}` for the given app, e.g.
/// `~/.config/myapp/config.toml` on Linux.
///
/// Returns `None` when no home directory can be determined.
pub fn platform_config_file(app_name: &str, file_name: &str) -> Option<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", app_name)?;
    Some(proj.config_dir().join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_names_every_unset_field() {
        let err = Setup::default().check().unwrap_err();
        match err {
            ValfigError::IncompleteSetup { missing } => {
                assert_eq!(
                    missing,
                    vec![
                        "app_version",
                        "app_name",
                        "config_file_path",
                        "config_sep_str"
                    ]
                );
            }
            other => panic!("Expected IncompleteSetup, got: {other:?}"),
        }
    }

    #[test]
    fn check_names_only_remaining_field() {
        let mut setup = Setup::default();
        setup.set_app_version("0.1");
        setup.set_app_name("test");
        setup.set_config_file_path("config.toml");
        let msg = setup.check().unwrap_err().to_string();
        assert!(msg.contains("config_sep_str"));
        assert!(!msg.contains("app_name"));
    }

    #[test]
    fn complete_setup_passes() {
        assert!(Setup::new("0.1", "test", "config.toml", "__").check().is_ok());
    }

    #[test]
    fn join_path_without_root() {
        let setup = Setup::new("0.1", "test", "config.toml", "__");
        assert_eq!(setup.join_path(&["key".into()]), "key");
    }

    #[test]
    fn join_path_with_root() {
        let setup = Setup::new("0.1", "test", "config.toml", "__").root_path(["MyApp"]);
        assert_eq!(setup.join_path(&["key".into()]), "MyApp__key");

        let setup = setup.root_path(["my", "awesome", "app"]);
        assert_eq!(setup.join_path(&["key".into()]), "my__awesome__app__key");
    }

    #[test]
    fn dotted_replaces_separator() {
        let setup = Setup::new("0.1", "test", "config.toml", "__");
        assert_eq!(setup.dotted("server__port"), "server.port");
    }

    #[test]
    fn env_var_name_is_uppercased() {
        let setup = Setup::new("0.1", "myapp", "config.toml", "__");
        assert_eq!(setup.env_var_name("a__b"), "MYAPP__A__B");
    }

    #[test]
    fn platform_config_file_ends_with_file_name() {
        if let Some(path) = platform_config_file("valfig-test", "config.toml") {
            assert!(path.ends_with("config.toml"));
        }
    }
}
