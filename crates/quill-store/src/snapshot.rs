//! JSON snapshots of a store
//!
//! Used by the admin tool to run backfills and audits against an exported
//! data set.

use crate::entities::{Comment, Post, User};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Serializable contents of a [`MemoryStore`](crate::MemoryStore)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Posts
    #[serde(default)]
    pub posts: Vec<Post>,
    /// User profiles
    #[serde(default)]
    pub users: Vec<User>,
    /// Comments
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Snapshot {
    /// Parse snapshot JSON
    ///
    /// # Errors
    /// `StoreError::Format` on malformed input
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    /// `StoreError::Format` if serialization fails
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read snapshot file
    ///
    /// # Errors
    /// `StoreError::Io` or `StoreError::Format`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let snapshot = Self::from_json(&raw)?;
        tracing::info!(
            "Loaded snapshot {}: {} posts, {} users, {} comments",
            path.as_ref().display(),
            snapshot.posts.len(),
            snapshot.users.len(),
            snapshot.comments.len()
        );
        Ok(snapshot)
    }

    /// Write snapshot file
    ///
    /// # Errors
    /// `StoreError::Io` or `StoreError::Format`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}
