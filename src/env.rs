use toml::Value;

/// Where environment variables are read from.
///
/// Tests pass synthetic data with [`EnvSource::Vars`] instead of touching the
/// process environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EnvSource {
    /// The process environment, read at every lookup.
    #[default]
    Process,
    /// A fixed list of `(name, value)` pairs.
    Vars(Vec<(String, String)>),
    /// Environment lookup disabled.
    Disabled,
}

impl EnvSource {
    /// Find the variable whose name equals `var_name`, ignoring case.
    ///
    /// Returns the actual variable name and its raw value.
    pub fn lookup(&self, var_name: &str) -> Option<(String, String)> {
        match self {
            EnvSource::Process => find_process_var(var_name),
            EnvSource::Vars(vars) => find_var(var_name, vars.iter().cloned()),
            EnvSource::Disabled => None,
        }
    }
}

/// Variables whose name is not valid UTF-8 are skipped; only the value of the
/// matching variable is decoded.
fn find_process_var(var_name: &str) -> Option<(String, String)> {
    let wanted = var_name.to_uppercase();
    std::env::vars_os().find_map(|(key, value)| {
        let key = key.to_str()?;
        (key.to_uppercase() == wanted)
            .then(|| (key.to_string(), value.to_string_lossy().into_owned()))
    })
}

fn find_var(
    var_name: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Option<(String, String)> {
    let wanted = var_name.to_uppercase();
    vars.into_iter().find(|(key, _)| key.to_uppercase() == wanted)
}

/// How a raw string is interpreted before casting.
///
/// Environment values only ever use `Verbatim` or `Boolean`; the numeric and
/// inline forms read values typed for `config set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Keep the string as is.
    Verbatim,
    /// Exactly `true` or `false`.
    Boolean,
    Integer,
    Float,
    /// Parse as an inline TOML value (arrays, inline tables).
    Inline,
}

/// Coerce a raw string for a declared type.
///
/// A string that does not parse is kept as a string so the cast step reports
/// the mismatch against the declared type.
pub fn coerce(raw: &str, coercion: Coercion) -> Value {
    let trimmed = raw.trim();
    match coercion {
        Coercion::Verbatim => Value::String(raw.to_string()),
        Coercion::Boolean => match raw {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => Value::String(raw.to_string()),
        },
        Coercion::Integer => trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Coercion::Float => {
            // "NaN" and "inf" parse as floats but are not meant as numbers here.
            if trimmed.chars().any(|c| c.is_ascii_digit())
                && let Ok(f) = trimmed.parse::<f64>()
            {
                return Value::Float(f);
            }
            Value::String(raw.to_string())
        }
        Coercion::Inline => parse_inline(trimmed).unwrap_or_else(|| Value::String(raw.to_string())),
    }
}

fn parse_inline(s: &str) -> Option<Value> {
    let mut table: toml::Table = format!("value = {s}").parse().ok()?;
    table.remove("value")
}
