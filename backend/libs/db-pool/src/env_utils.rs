//! Environment variable parsing helpers.

use std::str::FromStr;

/// Parsed value of `key`, or `default` when unset or unparsable.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parsed value of `key`, or `None` when unset or unparsable.
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parsed value of `key`; a missing or unparsable value is an error naming the key.
pub fn parse_env_required<T: FromStr>(key: &str) -> Result<T, String> {
    let raw = std::env::var(key).map_err(|_| format!("{key} must be set"))?;
    raw.trim()
        .parse()
        .map_err(|_| format!("{key} has an invalid value: '{raw}'"))
}
