//! Store collaborator interface
//!
//! One [`Collection`] per record kind. Implementations are expected to give
//! snapshot-consistent reads within a single call; nothing here spans calls.

use crate::entities::Record;
use crate::error::StoreError;
use crate::id::EntityId;

/// Storage for one kind of record
///
/// Implement this trait to back Quill with a real database. The in-memory
/// [`MemoryCollection`](crate::MemoryCollection) is the reference
/// implementation.
#[async_trait::async_trait]
pub trait Collection<R: Record>: Send + Sync {
    /// Fetch a record by id
    async fn get(&self, id: EntityId) -> Result<Option<R>, StoreError>;

    /// Indexed exact-match lookup on the stored token
    ///
    /// When several records hold the token, the oldest is returned.
    async fn find_by_token(&self, token: &str) -> Result<Option<R>, StoreError>;

    /// All records, oldest first
    async fn all(&self) -> Result<Vec<R>, StoreError>;

    /// Insert a new record
    ///
    /// # Errors
    /// `StoreError::Duplicate` if the id is already present
    async fn insert(&self, record: R) -> Result<EntityId, StoreError>;

    /// Apply a patch and return the updated record
    ///
    /// # Errors
    /// `StoreError::NotFound` if the id does not exist
    async fn patch(&self, id: EntityId, patch: R::Patch) -> Result<R, StoreError>;

    /// Remove a record
    ///
    /// # Errors
    /// `StoreError::NotFound` if the id does not exist
    async fn delete(&self, id: EntityId) -> Result<(), StoreError>;

    /// Fetch a record that must exist
    async fn require(&self, id: EntityId) -> Result<R, StoreError> {
        self.get(id).await?.ok_or(StoreError::NotFound { kind: R::KIND, id })
    }
}
