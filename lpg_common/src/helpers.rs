use std::{env, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads and parses the environment variable `name`.
///
/// Returns `None` when the variable is not set, and `Some(Err(raw_value))` when it is set but cannot be parsed, so
/// that callers can log a warning before falling back to a default.
pub fn parse_env_var<T: FromStr>(name: &str) -> Option<Result<T, String>> {
    let raw = env::var(name).ok()?;
    Some(raw.trim().parse::<T>().map_err(|_| raw))
}

/// Returns the first of the given environment variables that is set to a non-empty value.
pub fn first_env_var(names: &[&str]) -> Option<String> {
    names.iter().filter_map(|name| env::var(name).ok()).find(|v| !v.trim().is_empty())
}
