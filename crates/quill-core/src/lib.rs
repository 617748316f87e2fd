//! Quill Core - blog services
//!
//! The service layer of a Medium-style blog:
//! - Assigns URL slugs to posts and usernames to profiles
//! - Keeps tokens unique with numeric suffixes, excluding the record's own id
//! - Resolves tokens on read, including legacy records stored without one
//! - Backfills legacy records lazily on read or eagerly in one pass
//! - Enforces authentication and ownership on writes
//! - Assembles threaded comments
//!
//! # Example
//!
//! ```rust
//! use quill_core::{NewPost, Quill, QuillConfig, StaticAuth};
//! use quill_store::{EntityId, MemoryStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), quill_core::QuillError> {
//! let store = MemoryStore::new();
//! let auth = Arc::new(StaticAuth::signed_in(EntityId::new()));
//! let quill = Quill::in_memory(&store, auth, QuillConfig::new())?;
//!
//! let first = quill.posts().create_post(NewPost::new("Hello World", "...")).await?;
//! let second = quill.posts().create_post(NewPost::new("Hello World", "...")).await?;
//! assert_eq!(first.slug, "hello-world");
//! assert_eq!(second.slug, "hello-world-1");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod auth;
pub mod comments;
pub mod config;
pub mod error;
pub mod identifier;
pub mod posts;
pub mod quill;
pub mod resolver;
pub mod users;

// Re-exports for convenience
pub use auth::{AuthProvider, StaticAuth};
pub use comments::{build_tree, CommentNode, CommentService};
pub use config::{ContentLimits, IdentifierConfig, ListingConfig, QuillConfig};
pub use error::{friendly_message, QuillError};
pub use identifier::{BackfillReport, DuplicateToken, IdentifierService, Resolution, SlugState};
pub use posts::{ListQuery, NewPost, PostService, PostUpdate, PostView};
pub use quill::{AuditReport, BackfillSummary, Collections, Quill};
pub use resolver::UniquenessResolver;
pub use users::{ProfileUpdate, ProfileView, UserService};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Quill services
    pub use crate::{
        AuthProvider, NewPost, PostUpdate, ProfileUpdate, Quill, QuillConfig, QuillError,
        StaticAuth,
    };
    pub use quill_store::{EntityId, MemoryStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
