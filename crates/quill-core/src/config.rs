//! Quill configuration
//!
//! All sections have defaults, so an empty TOML document is a valid
//! configuration.
//!
//! ```toml
//! [identifiers]
//! max_attempts = 1000
//! post_fallback = "post"
//! user_fallback = "user"
//! backfill_on_read = true
//!
//! [content]
//! max_title_len = 200
//! max_comment_len = 5000
//!
//! [listing]
//! default_limit = 20
//! max_limit = 100
//! ```

use crate::error::QuillError;
use quill_slug::{is_canonical, SlugKind, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Quill configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    /// Slug and username assignment
    pub identifiers: IdentifierConfig,
    /// Content limits
    pub content: ContentLimits,
    /// Listing and search page sizes
    pub listing: ListingConfig,
}

impl QuillConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With resolver attempt bound
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.identifiers.max_attempts = max_attempts;
        self
    }

    /// With lazy backfill on read toggled
    #[inline]
    #[must_use]
    pub fn with_backfill_on_read(mut self, enabled: bool) -> Self {
        self.identifiers.backfill_on_read = enabled;
        self
    }

    /// With listing page sizes
    #[inline]
    #[must_use]
    pub fn with_listing(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.listing = ListingConfig {
            default_limit,
            max_limit,
        };
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// `QuillError::Config` on syntax errors or invalid values
    pub fn from_toml_str(raw: &str) -> Result<Self, QuillError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| QuillError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `QuillError::Config` if the file cannot be read or is invalid
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, QuillError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| QuillError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check value constraints
    ///
    /// # Errors
    /// `QuillError::Config` naming the first offending key
    pub fn validate(&self) -> Result<(), QuillError> {
        let ids = &self.identifiers;
        if ids.max_attempts == 0 {
            return Err(QuillError::Config(
                "identifiers.max_attempts must be at least 1".to_string(),
            ));
        }
        for (key, token) in [
            ("identifiers.post_fallback", &ids.post_fallback),
            ("identifiers.user_fallback", &ids.user_fallback),
        ] {
            if !is_canonical(token) {
                return Err(QuillError::Config(format!(
                    "{key} must be a canonical slug, got {token:?}"
                )));
            }
        }
        if self.content.max_title_len == 0 || self.content.max_comment_len == 0 {
            return Err(QuillError::Config("content limits must be positive".to_string()));
        }
        if self.listing.default_limit == 0 || self.listing.default_limit > self.listing.max_limit {
            return Err(QuillError::Config(
                "listing.default_limit must be between 1 and listing.max_limit".to_string(),
            ));
        }
        Ok(())
    }
}

/// Identifier assignment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Checked candidates before the timestamp fallback
    pub max_attempts: u32,
    /// Fallback token for posts
    pub post_fallback: String,
    /// Fallback token for users
    pub user_fallback: String,
    /// Persist derived tokens on legacy records when they are read
    pub backfill_on_read: bool,
}

impl IdentifierConfig {
    /// Fallback token for a slug kind
    #[inline]
    #[must_use]
    pub fn fallback(&self, kind: SlugKind) -> &str {
        match kind {
            SlugKind::Post => &self.post_fallback,
            SlugKind::User => &self.user_fallback,
        }
    }
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            post_fallback: SlugKind::Post.fallback().to_string(),
            user_fallback: SlugKind::User.fallback().to_string(),
            backfill_on_read: true,
        }
    }
}

/// Content size limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLimits {
    /// Maximum title length in characters
    pub max_title_len: usize,
    /// Maximum comment length in characters
    pub max_comment_len: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_title_len: 200,
            max_comment_len: 5000,
        }
    }
}

/// Listing page sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Page size when none is requested
    pub default_limit: usize,
    /// Upper bound on requested page size
    pub max_limit: usize,
}

impl ListingConfig {
    /// Effective page size for a request
    #[inline]
    #[must_use]
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).clamp(1, self.max_limit)
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}
