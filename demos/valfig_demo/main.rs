//! # valfig demo application
//!
//! A sample CLI tool showing how an application declares its configuration
//! values with valfig and exposes the `config` subcommands. It exists to
//! demonstrate and manually verify valfig's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example valfig_demo -- echo
//! cargo run --example valfig_demo -- config list
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature               | How to exercise it                                                         |
//! |-----------------------|----------------------------------------------------------------------------|
//! | Declared defaults     | `cargo run --example valfig_demo -- echo`                                  |
//! | Mandatory value       | `echo` fails until `name` is set somewhere                                 |
//! | Config file           | `valfig-demo.toml` in the current directory                                |
//! | Env var override      | `VALFIG_DEMO__DISPLAY__COLOR=red cargo run --example valfig_demo -- echo`  |
//! | Bounds check          | `cargo run --example valfig_demo -- config set server.port 0`              |
//! | Env type check        | `VALFIG_DEMO__SERVER__PORT=9999 cargo run --example valfig_demo -- echo`   |
//! | `config gen`          | `cargo run --example valfig_demo -- config gen`                            |
//! | `config get`          | `cargo run --example valfig_demo -- config get server.port`                |
//! | `config set`          | `cargo run --example valfig_demo -- config set name demo`                  |
//! | `config unset`        | `cargo run --example valfig_demo -- config unset name`                     |
//! | `config check`        | `cargo run --example valfig_demo -- config check`                          |
//! | Single key echo       | `cargo run --example valfig_demo -- echo --key display.color`              |

use clap::{Parser, Subcommand};

use valfig::{ConfigArgs, ConfigValue, Handle, Valfig, ValfigError, ValueType};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// valfig demo: a sample CLI app declaring its configuration with valfig.
#[derive(Parser, Debug)]
#[command(name = "valfig-demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print resolved configuration values (colored by display.color).
    Echo {
        /// Print only this dotted key instead of all values.
        #[arg(long)]
        key: Option<String>,
    },
    /// Manage the configuration file (gen, list, get, set, unset, check).
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Declared values
// ---------------------------------------------------------------------------

struct DemoValues {
    name: Handle<String>,
    verbose: Handle<bool>,
    host: Handle<String>,
    port: Handle<i64>,
    tags: Handle<Vec<toml::Value>>,
    color: Handle<String>,
    format: Handle<String>,
}

/// Build the demo context: the config file lives in the current directory,
/// environment variables are prefixed with `VALFIG_DEMO__`.
fn make_valfig() -> Result<(Valfig, DemoValues), ValfigError> {
    let mut valfig = Valfig::builder()
        .app_name("valfig_demo")
        .app_version(env!("CARGO_PKG_VERSION"))
        .config_file("valfig-demo.toml")
        .build();

    let values = DemoValues {
        name: valfig.declare(ConfigValue::string(["name"], "Name shown in the echo header."))?,
        verbose: valfig
            .declare(ConfigValue::boolean(["verbose"], "Enable verbose output.").default(false))?,
        host: valfig.declare(
            ConfigValue::string(["server", "host"], "Address the server binds to.")
                .default("127.0.0.1"),
        )?,
        port: valfig.declare(
            ConfigValue::integer(["server", "port"], "Port the server listens on.")
                .default(8080)
                .limits(Some(1), Some(65535)),
        )?,
        tags: valfig.declare(
            ConfigValue::list(["server", "tags"], ValueType::String, "Free-form server tags.")
                .optional(),
        )?,
        color: valfig.declare(
            ConfigValue::string(
                ["display", "color"],
                "Output color (red, green, yellow, blue, magenta, cyan).",
            )
            .default("yellow"),
        )?,
        format: valfig.declare(
            ConfigValue::string(["display", "format"], "Output format: table or plain.")
                .default("table"),
        )?,
    };
    Ok((valfig, values))
}

// ---------------------------------------------------------------------------
// ANSI color helpers
// ---------------------------------------------------------------------------

fn ansi_color_code(name: &str) -> &str {
    match name {
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        "white" => "\x1b[37m",
        _ => "\x1b[0m",
    }
}

const RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn echo(valfig: &Valfig, values: &DemoValues, key: Option<&str>) -> Result<(), ValfigError> {
    valfig.validate(true)?;

    let color = valfig.get(&values.color)?;
    let color = ansi_color_code(&color);

    if valfig.get(&values.verbose)? {
        println!(
            "{color}[verbose] Resolved configuration for {:?}{RESET}",
            valfig.get(&values.name)?
        );
        println!();
    }

    let tags = match valfig.get_opt(&values.tags)? {
        Some(tags) => toml::Value::Array(tags).to_string(),
        None => "<not set>".to_string(),
    };
    let entries = [
        ("name", valfig.get(&values.name)?),
        ("verbose", valfig.get(&values.verbose)?.to_string()),
        ("server.host", valfig.get(&values.host)?),
        ("server.port", valfig.get(&values.port)?.to_string()),
        ("server.tags", tags),
        ("display.color", valfig.get(&values.color)?),
        ("display.format", valfig.get(&values.format)?),
    ];

    if let Some(key) = key {
        let Some((key, value)) = entries.iter().find(|(k, _)| *k == key) else {
            return Err(ValfigError::UnknownValue(key.to_string()));
        };
        println!("{color}{key}{RESET}  {value}");
        return Ok(());
    }

    if valfig.get(&values.format)? == "plain" {
        for (key, value) in &entries {
            println!("{key}={value}");
        }
    } else {
        let max_key_len = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in &entries {
            println!("{color}{key:<max_key_len$}{RESET}  {value}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    let (valfig, values) = make_valfig().unwrap_or_else(|e| {
        eprintln!("Failed to declare config values:\n{e}");
        std::process::exit(1);
    });

    match cli.command {
        Commands::Echo { key } => {
            echo(&valfig, &values, key.as_deref()).unwrap_or_else(|e| {
                eprintln!("Failed to load config:\n{e}");
                std::process::exit(1);
            });
        }
        Commands::Config(args) => {
            let action = args.into_action();
            valfig.handle_and_print(&action).unwrap_or_else(|e| {
                eprintln!("Config error:\n{e}");
                std::process::exit(1);
            });
        }
    }
}
