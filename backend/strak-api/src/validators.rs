use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, Result};

/// Input validation helpers that the `validator` derives can't express.

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("hardcoded username regex is invalid")
});

static LANGUAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,4})?$").expect("hardcoded language regex is invalid")
});

pub const MAX_SEARCH_QUERY_CHARS: usize = 100;

/// 3-30 characters: letters, digits and underscores.
pub fn validate_username(username: &str) -> Result<()> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Username must be 3-30 characters of letters, numbers or underscores".to_string(),
        ))
    }
}

/// Language tags like `en`, `pt-BR`, `zh-Hant`.
pub fn validate_language(language: &str) -> Result<()> {
    if LANGUAGE_REGEX.is_match(language) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "'{language}' is not a supported language code"
        )))
    }
}

/// Trim optional free text; blank input becomes `None` (clears the field).
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trim and bound a search query.
pub fn normalize_search_query(raw: &str) -> Result<String> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(AppError::Validation(
            "Search query must not be empty".to_string(),
        ));
    }
    if query.chars().count() > MAX_SEARCH_QUERY_CHARS {
        return Err(AppError::Validation(format!(
            "Search query must be at most {MAX_SEARCH_QUERY_CHARS} characters"
        )));
    }
    Ok(query.to_string())
}

/// Escape `\`, `%` and `_` so the value matches literally inside `LIKE ... ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
