//! Username rules
//!
//! User-chosen usernames are stricter than derived slugs: they also allow
//! underscores but must start with a letter or digit.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum username length
pub const MIN_LEN: usize = 3;

/// Maximum username length
pub const MAX_LEN: usize = 30;

static USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("username pattern is valid"));

/// Reasons a username is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    /// Empty after trimming
    #[error("username cannot be empty")]
    Empty,

    /// Outside the length bounds
    #[error("username must be between 3 and 30 characters, got {0}")]
    Length(usize),

    /// Disallowed character or leading symbol
    #[error("username may only contain lowercase letters, digits, '-' and '_', and must start with a letter or digit")]
    InvalidCharacters,
}

/// Validate a requested username
///
/// Input is trimmed and lowercased first; the cleaned form is returned.
///
/// # Errors
/// Returns [`UsernameError`] describing the first rule violated.
pub fn validate_username(raw: &str) -> Result<String, UsernameError> {
    let cleaned = raw.trim().to_lowercase();
    if cleaned.is_empty() {
        return Err(UsernameError::Empty);
    }

    let len = cleaned.chars().count();
    if !(MIN_LEN..=MAX_LEN).contains(&len) {
        return Err(UsernameError::Length(len));
    }

    if !USERNAME.is_match(&cleaned) {
        return Err(UsernameError::InvalidCharacters);
    }

    Ok(cleaned)
}
