//! Collision candidate sequence
//!
//! Provides [`Candidates`], the ordered list of tokens tried when a base
//! slug is already taken. The sequence is `base`, `base-1`, `base-2`, ...
//! and ends with a single timestamp-suffixed token once the attempt bound
//! is reached, so a caller driving it always terminates.

use chrono::Utc;

/// Attempt bound used when none is configured
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// One entry of the candidate sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Must be checked against the registry before use
    Checked(String),

    /// Timestamp-suffixed token, used without checking
    Fallback(String),
}

impl Candidate {
    /// The candidate token
    #[inline]
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Checked(token) | Self::Fallback(token) => token,
        }
    }

    /// Consume into the token
    #[inline]
    #[must_use]
    pub fn into_token(self) -> String {
        match self {
            Self::Checked(token) | Self::Fallback(token) => token,
        }
    }

    /// Whether this is the terminal timestamp fallback
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Iterator over collision candidates for a base token
///
/// Yields `max_attempts` checked candidates followed by one fallback.
/// A bound of zero is treated as one, so the base is always tried.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    base: &'a str,
    attempt: u32,
    max_attempts: u32,
    finished: bool,
}

impl<'a> Candidates<'a> {
    /// Create sequence for `base`
    #[inline]
    #[must_use]
    pub fn new(base: &'a str, max_attempts: u32) -> Self {
        Self {
            base,
            attempt: 0,
            max_attempts: max_attempts.max(1),
            finished: false,
        }
    }

    /// Base token the sequence was built from
    #[inline]
    #[must_use]
    pub fn base(&self) -> &str {
        self.base
    }

    /// Number of candidates yielded so far
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.attempt >= self.max_attempts {
            self.finished = true;
            return Some(Candidate::Fallback(fallback_token(
                self.base,
                Utc::now().timestamp_millis(),
            )));
        }

        let token = if self.attempt == 0 {
            self.base.to_string()
        } else {
            format!("{}-{}", self.base, self.attempt)
        };
        self.attempt += 1;
        Some(Candidate::Checked(token))
    }
}

/// Timestamp-suffixed token for `base`
#[inline]
#[must_use]
pub fn fallback_token(base: &str, unix_millis: i64) -> String {
    format!("{base}-{unix_millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_with_base() {
        let mut seq = Candidates::new("hello-world", 10);
        assert_eq!(seq.next(), Some(Candidate::Checked("hello-world".into())));
        assert_eq!(seq.next(), Some(Candidate::Checked("hello-world-1".into())));
        assert_eq!(seq.next(), Some(Candidate::Checked("hello-world-2".into())));
        assert_eq!(seq.attempts(), 3);
    }

    #[test]
    fn sequence_ends_with_single_fallback() {
        let all: Vec<_> = Candidates::new("post", 3).collect();

        assert_eq!(all.len(), 4);
        assert_eq!(all[2], Candidate::Checked("post-2".into()));
        assert!(all[3].is_fallback());
        assert!(all[3].token().starts_with("post-"));
    }

    #[test]
    fn default_bound_checks_one_thousand() {
        let checked = Candidates::new("x", DEFAULT_MAX_ATTEMPTS)
            .take_while(|c| !c.is_fallback())
            .count();

        assert_eq!(checked, 1000);
    }

    #[test]
    fn zero_bound_still_tries_base() {
        let mut seq = Candidates::new("a", 0);
        assert_eq!(seq.next(), Some(Candidate::Checked("a".into())));
        assert!(seq.next().is_some_and(|c| c.is_fallback()));
        assert_eq!(seq.next(), None);
    }

    #[test]
    fn fallback_token_format() {
        assert_eq!(fallback_token("hello", 1_700_000_000_000), "hello-1700000000000");
    }

    #[test]
    fn candidate_into_token() {
        assert_eq!(Candidate::Fallback("a-1".into()).into_token(), "a-1");
    }
}
