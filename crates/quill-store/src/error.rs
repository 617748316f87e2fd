//! Error types for the store

use crate::id::{EntityId, EntityKind};

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: EntityId },

    /// Record id already present
    #[error("duplicate {kind} id: {id}")]
    Duplicate { kind: EntityKind, id: EntityId },

    /// Snapshot file could not be read or written
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot content is not valid JSON for the schema
    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),

    /// Failure reported by a backing store
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if error is a missing record
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::NotFound {
            kind: EntityKind::Post,
            id: EntityId::new(),
        };
        assert!(err.to_string().starts_with("post not found"));
        assert!(err.is_not_found());
    }

    #[test]
    fn backend_is_not_not_found() {
        assert!(!StoreError::Backend("down".into()).is_not_found());
    }
}
