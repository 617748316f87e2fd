//! Quill Store
//!
//! Entity records and the storage collaborator they live behind.
//!
//! # Overview
//!
//! - **EntityId**: opaque, sortable record identifier
//! - **Post / User / Comment**: the persisted records
//! - **Collection**: async store interface (get, exact-token lookup,
//!   full scan, insert, patch, delete)
//! - **MemoryCollection / MemoryStore**: `DashMap`-backed implementation
//!   with a secondary token index
//! - **Snapshot**: JSON import/export of a whole store
//!
//! # Example
//!
//! ```rust
//! use quill_store::{Collection, EntityId, MemoryCollection, Post};
//!
//! # async fn example() -> Result<(), quill_store::StoreError> {
//! let posts = MemoryCollection::<Post>::new();
//! let post = Post::new(EntityId::new(), "Hello World", "body").with_slug("hello-world");
//! let id = posts.insert(post).await?;
//!
//! let found = posts.find_by_token("hello-world").await?;
//! assert_eq!(found.map(|p| p.id), Some(id));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod collection;
pub mod entities;
pub mod error;
pub mod id;
pub mod memory;
pub mod snapshot;

// Re-exports
pub use collection::Collection;
pub use entities::{Comment, CommentPatch, Post, PostPatch, Record, Sluggable, User, UserPatch};
pub use error::StoreError;
pub use id::{EntityId, EntityKind};
pub use memory::{MemoryCollection, MemoryStore};
pub use snapshot::Snapshot;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for store operations
    pub use crate::{
        Collection, Comment, EntityId, EntityKind, MemoryCollection, MemoryStore, Post, Record,
        Sluggable, StoreError, User,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
