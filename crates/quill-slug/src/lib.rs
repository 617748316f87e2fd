//! Quill Slug System
//!
//! URL-safe identifiers derived from titles and display names.
//!
//! # Overview
//!
//! The slug system provides:
//! - **normalize**: total mapping from free text to a canonical token
//! - **Candidates**: the collision sequence `base`, `base-1`, ... with a
//!   timestamp fallback once the attempt bound is reached
//! - **validate_username**: rules for user-chosen usernames
//!
//! # Example
//!
//! ```rust
//! use quill_slug::{normalize, Candidate, Candidates, SlugKind};
//!
//! let base = normalize("  ¡Hola, Mundo!  ", SlugKind::Post);
//! assert_eq!(base, "hola-mundo");
//!
//! let mut candidates = Candidates::new(&base, 1000);
//! assert_eq!(candidates.next(), Some(Candidate::Checked("hola-mundo".into())));
//! assert_eq!(candidates.next(), Some(Candidate::Checked("hola-mundo-1".into())));
//! ```

#![warn(missing_docs)]

pub mod candidates;
pub mod normalize;
pub mod username;

// Re-exports
pub use candidates::{fallback_token, Candidate, Candidates, DEFAULT_MAX_ATTEMPTS};
pub use normalize::{is_canonical, normalize, normalize_or, SlugKind};
pub use username::{validate_username, UsernameError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for slug operations
    pub use crate::{normalize, normalize_or, Candidate, Candidates, SlugKind};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
