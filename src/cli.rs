//! Clap adapter for valfig.
//!
//! This module is the optional integration layer between valfig's
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! [`ConfigArgs`] can be embedded directly into a clap derive to get
//! `config gen|list|get|set|unset|check` subcommands. The only bridge to the
//! core is [`ConfigArgs::into_action()`], which converts the parsed arguments
//! into a [`ConfigAction`](crate::ConfigAction) handled by
//! [`Valfig::handle()`](crate::Valfig::handle).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::ConfigAction;

/// Clap-derived args for the `config` subcommand group.
///
/// Embed this into your app's clap derive:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show every declared value as resolved right now.
    List,
    /// Generate the documented example config file.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show a value with its description and type.
    Get {
        /// Dotted value name (e.g. "database.url").
        name: String,
    },
    /// Persist a value to the config file.
    Set {
        /// Dotted value name (e.g. "database.url").
        name: String,
        /// Value to set, written the way it would be given in the environment.
        value: String,
    },
    /// Remove a value from the config file.
    Unset {
        /// Dotted value name (e.g. "database.url").
        name: String,
    },
    /// Check that every mandatory value is set and no value is declared twice.
    Check,
}

impl ConfigArgs {
    /// Convert clap-parsed args into a framework-agnostic `ConfigAction`.
    ///
    /// Bare `config` (no subcommand) and explicit `config list` both map to
    /// `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Gen { output }) => ConfigAction::Gen { output },
            Some(ConfigSubcommand::Get { name }) => ConfigAction::Get { name },
            Some(ConfigSubcommand::Set { name, value }) => ConfigAction::Set { name, value },
            Some(ConfigSubcommand::Unset { name }) => ConfigAction::Unset { name },
            Some(ConfigSubcommand::Check) => ConfigAction::Check,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Wrapper so we can use `try_parse_from` on the subcommand.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> ConfigAction {
        TestCli::try_parse_from(args).unwrap().config.into_action()
    }

    #[test]
    fn parse_gen_no_output() {
        assert_eq!(parse(&["test", "gen"]), ConfigAction::Gen { output: None });
    }

    #[test]
    fn parse_gen_with_output() {
        assert_eq!(
            parse(&["test", "gen", "-o", "out.toml"]),
            ConfigAction::Gen {
                output: Some(PathBuf::from("out.toml"))
            }
        );
        assert_eq!(
            parse(&["test", "gen", "--output", "/etc/myapp.toml"]),
            ConfigAction::Gen {
                output: Some(PathBuf::from("/etc/myapp.toml"))
            }
        );
    }

    #[test]
    fn parse_get() {
        assert_eq!(
            parse(&["test", "get", "database.url"]),
            ConfigAction::Get {
                name: "database.url".into(),
            }
        );
    }

    #[test]
    fn parse_set() {
        assert_eq!(
            parse(&["test", "set", "host", "0.0.0.0"]),
            ConfigAction::Set {
                name: "host".into(),
                value: "0.0.0.0".into(),
            }
        );
    }

    #[test]
    fn parse_set_list_value() {
        assert_eq!(
            parse(&["test", "set", "names", r#"["a", "b"]"#]),
            ConfigAction::Set {
                name: "names".into(),
                value: r#"["a", "b"]"#.into(),
            }
        );
    }

    #[test]
    fn parse_unset() {
        assert_eq!(
            parse(&["test", "unset", "database.url"]),
            ConfigAction::Unset {
                name: "database.url".into(),
            }
        );
    }

    #[test]
    fn parse_check() {
        assert_eq!(parse(&["test", "check"]), ConfigAction::Check);
    }

    #[test]
    fn parse_bare_config_is_list() {
        assert_eq!(parse(&["test"]), ConfigAction::List);
        assert_eq!(parse(&["test", "list"]), ConfigAction::List);
    }

    #[test]
    fn invalid_subcommand_errors() {
        assert!(TestCli::try_parse_from(["test", "nope"]).is_err());
    }

    #[test]
    fn set_requires_value() {
        assert!(TestCli::try_parse_from(["test", "set", "port"]).is_err());
    }
}
