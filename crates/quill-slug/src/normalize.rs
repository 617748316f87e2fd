//! Slug normalization
//!
//! Provides [`normalize`] for mapping arbitrary text to a canonical token.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

static CANONICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("canonical slug pattern is valid")
});

/// Entity kind a slug is derived for
///
/// The kind only decides the fallback token used when the text
/// normalizes to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugKind {
    /// Content entity (post), fallback `post`
    Post,

    /// Identity entity (user), fallback `user`
    User,
}

impl SlugKind {
    /// Token returned when normalization yields an empty string
    #[inline]
    #[must_use]
    pub fn fallback(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::User => "user",
        }
    }
}

impl Display for SlugKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Post => "post",
            Self::User => "user",
        })
    }
}

/// Normalize text into a URL-safe token
///
/// Lowercases and trims, turns whitespace runs into a single hyphen, drops
/// everything outside `[a-z0-9-]`, collapses hyphen runs and strips edge
/// hyphens. Returns the kind's fallback when nothing survives.
///
/// # Example
/// ```
/// use quill_slug::{normalize, SlugKind};
///
/// assert_eq!(normalize("My First Post", SlugKind::Post), "my-first-post");
/// assert_eq!(normalize("!!!", SlugKind::User), "user");
/// ```
#[must_use]
pub fn normalize(text: &str, kind: SlugKind) -> String {
    normalize_or(text, kind.fallback())
}

/// Normalize with an explicit fallback token
#[must_use]
pub fn normalize_or(text: &str, fallback: &str) -> String {
    let lowered = text.trim().to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            // separators are only emitted between kept characters
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else if ch == '-' || ch.is_whitespace() {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Check whether a token is already in canonical form
///
/// Canonical tokens match `^[a-z0-9]+(-[a-z0-9]+)*$`.
#[inline]
#[must_use]
pub fn is_canonical(token: &str) -> bool {
    CANONICAL.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_simple_title() {
        assert_eq!(normalize("Hello World", SlugKind::Post), "hello-world");
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize("Hello World!!!", SlugKind::Post), "hello-world");
        assert_eq!(
            normalize("Rust's ownership, explained", SlugKind::Post),
            "rusts-ownership-explained"
        );
    }

    #[test]
    fn normalize_drops_non_ascii_letters() {
        assert_eq!(normalize("  ¡Hola, Mundo!  ", SlugKind::Post), "hola-mundo");
        assert_eq!(normalize("Café au lait", SlugKind::Post), "caf-au-lait");
    }

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize("a   b\t\nc", SlugKind::Post), "a-b-c");
        assert_eq!(normalize("a -- b", SlugKind::Post), "a-b");
        assert_eq!(normalize("--edge--", SlugKind::Post), "edge");
    }

    #[test]
    fn normalize_joins_across_stripped_chars() {
        assert_eq!(normalize("a!b", SlugKind::Post), "ab");
        assert_eq!(normalize("under_score", SlugKind::Post), "underscore");
    }

    #[test]
    fn normalize_empty_uses_fallback() {
        assert_eq!(normalize("", SlugKind::Post), "post");
        assert_eq!(normalize("   ", SlugKind::User), "user");
        assert_eq!(normalize("¿¡!?", SlugKind::Post), "post");
    }

    #[test]
    fn normalize_or_custom_fallback() {
        assert_eq!(normalize_or("", "untitled"), "untitled");
    }

    #[test]
    fn normalize_keeps_digits() {
        assert_eq!(normalize("Top 10 Crates of 2024", SlugKind::Post), "top-10-crates-of-2024");
    }

    #[test]
    fn canonical_detection() {
        assert!(is_canonical("hello-world"));
        assert!(is_canonical("a1"));
        assert!(!is_canonical("Hello"));
        assert!(!is_canonical("-a"));
        assert!(!is_canonical("a--b"));
        assert!(!is_canonical(""));
    }

    #[test]
    fn slug_kind_display() {
        assert_eq!(SlugKind::Post.to_string(), "post");
        assert_eq!(SlugKind::User.fallback(), "user");
    }
}
