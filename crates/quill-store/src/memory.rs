//! In-memory store
//!
//! [`MemoryCollection`] keeps records in a `DashMap` with a secondary
//! token index. The index tolerates several holders per token: uniqueness
//! is the identifier service's job, and the store reports what it holds.

use crate::collection::Collection;
use crate::entities::{Comment, Post, Record, User};
use crate::error::StoreError;
use crate::id::EntityId;
use crate::snapshot::Snapshot;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// `DashMap`-backed collection
#[derive(Debug)]
pub struct MemoryCollection<R: Record> {
    /// Primary storage: id -> record
    records: DashMap<EntityId, R>,

    /// Token index: token -> holders
    by_token: DashMap<String, BTreeSet<EntityId>>,
}

impl<R: Record> MemoryCollection<R> {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            by_token: DashMap::new(),
        }
    }

    /// Build from existing records, skipping repeated ids
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = R>) -> Self {
        let collection = Self::new();
        for record in records {
            let id = record.id();
            if collection.records.contains_key(&id) {
                tracing::warn!("Skipping repeated {} id {}", R::KIND, id);
                continue;
            }
            collection.index(id, record.token());
            collection.records.insert(id, record);
        }
        collection
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids currently holding `token`
    #[must_use]
    pub fn holders(&self, token: &str) -> Vec<EntityId> {
        self.by_token
            .get(token)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All records, oldest first, without going through the async trait
    #[must_use]
    pub fn records(&self) -> Vec<R> {
        let mut all: Vec<R> = self.records.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|r| r.id());
        all
    }

    fn index(&self, id: EntityId, token: Option<&str>) {
        if let Some(token) = token {
            self.by_token.entry(token.to_string()).or_default().insert(id);
        }
    }

    fn unindex(&self, id: EntityId, token: Option<&str>) {
        let Some(token) = token else {
            return;
        };
        let now_empty = match self.by_token.get_mut(token) {
            Some(mut ids) => {
                ids.remove(&id);
                ids.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_token.remove_if(token, |_, ids| ids.is_empty());
        }
    }
}

impl<R: Record> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<R: Record> Collection<R> for MemoryCollection<R> {
    async fn get(&self, id: EntityId) -> Result<Option<R>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<R>, StoreError> {
        // a racing patch and delete can leave a stale id behind; skip it
        Ok(self
            .holders(token)
            .iter()
            .find_map(|id| self.records.get(id).map(|r| r.value().clone())))
    }

    async fn all(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.records())
    }

    async fn insert(&self, record: R) -> Result<EntityId, StoreError> {
        let id = record.id();
        match self.records.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(StoreError::Duplicate { kind: R::KIND, id });
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                self.index(id, record.token());
                slot.insert(record);
            }
        }
        tracing::debug!("Inserted {} {}", R::KIND, id);
        Ok(id)
    }

    async fn patch(&self, id: EntityId, patch: R::Patch) -> Result<R, StoreError> {
        let (old_token, updated) = {
            let mut entry = self
                .records
                .get_mut(&id)
                .ok_or(StoreError::NotFound { kind: R::KIND, id })?;
            let old_token = entry.token().map(str::to_string);
            entry.apply(patch);
            (old_token, entry.value().clone())
        };

        if old_token.as_deref() != updated.token() {
            self.unindex(id, old_token.as_deref());
            self.index(id, updated.token());
        }
        Ok(updated)
    }

    async fn delete(&self, id: EntityId) -> Result<(), StoreError> {
        let (_, removed) = self
            .records
            .remove(&id)
            .ok_or(StoreError::NotFound { kind: R::KIND, id })?;
        self.unindex(id, removed.token());
        tracing::debug!("Deleted {} {}", R::KIND, id);
        Ok(())
    }
}

/// All collections of one Quill deployment
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Posts
    pub posts: Arc<MemoryCollection<Post>>,
    /// User profiles
    pub users: Arc<MemoryCollection<User>>,
    /// Comments
    pub comments: Arc<MemoryCollection<Comment>>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build store from a snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            posts: Arc::new(MemoryCollection::from_records(snapshot.posts)),
            users: Arc::new(MemoryCollection::from_records(snapshot.users)),
            comments: Arc::new(MemoryCollection::from_records(snapshot.comments)),
        }
    }

    /// Capture the current contents
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            posts: self.posts.records(),
            users: self.users.records(),
            comments: self.comments.records(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PostPatch;

    fn post(title: &str, slug: Option<&str>) -> Post {
        let post = Post::new(EntityId::new(), title, "body");
        match slug {
            Some(s) => post.with_slug(s),
            None => post,
        }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let posts = MemoryCollection::new();
        let p = post("A", Some("a"));
        let id = posts.insert(p.clone()).await.unwrap();

        assert_eq!(posts.get(id).await.unwrap(), Some(p));
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let posts = MemoryCollection::new();
        let p = post("A", None);
        posts.insert(p.clone()).await.unwrap();

        let err = posts.insert(p).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn token_index_follows_patches() {
        let posts = MemoryCollection::new();
        let id = posts.insert(post("A", Some("a"))).await.unwrap();

        posts.patch(id, PostPatch::default().slug("b")).await.unwrap();

        assert!(posts.find_by_token("a").await.unwrap().is_none());
        assert_eq!(posts.find_by_token("b").await.unwrap().map(|p| p.id), Some(id));
        assert!(posts.holders("a").is_empty());
    }

    #[tokio::test]
    async fn token_index_keeps_every_holder() {
        let posts = MemoryCollection::new();
        let first = posts.insert(post("A", Some("same"))).await.unwrap();
        let second = posts.insert(post("B", Some("same"))).await.unwrap();

        assert_eq!(posts.holders("same").len(), 2);
        assert_eq!(posts.find_by_token("same").await.unwrap().map(|p| p.id), Some(first));

        posts.delete(first).await.unwrap();
        assert_eq!(posts.find_by_token("same").await.unwrap().map(|p| p.id), Some(second));
    }

    #[tokio::test]
    async fn find_by_token_skips_stale_holders() {
        let posts = MemoryCollection::new();
        let live = posts.insert(post("Live", Some("shared"))).await.unwrap();
        // an id older than every record, left in the index without a record
        let stale = EntityId(ulid::Ulid::nil());
        posts.index(stale, Some("shared"));

        assert_eq!(posts.holders("shared").first(), Some(&stale));
        assert_eq!(posts.find_by_token("shared").await.unwrap().map(|p| p.id), Some(live));
    }

    #[tokio::test]
    async fn patch_missing_is_not_found() {
        let posts: MemoryCollection<Post> = MemoryCollection::new();
        let err = posts.patch(EntityId::new(), PostPatch::default()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let posts: MemoryCollection<Post> = MemoryCollection::new();
        assert!(posts.delete(EntityId::new()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn require_reports_missing() {
        let users: MemoryCollection<User> = MemoryCollection::new();
        assert!(users.require(EntityId::new()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn all_is_oldest_first() {
        let posts = MemoryCollection::new();
        let a = post("A", None);
        let b = post("B", None);
        posts.insert(b.clone()).await.unwrap();
        posts.insert(a.clone()).await.unwrap();

        let ids: Vec<_> = posts.all().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn from_records_skips_repeats() {
        let p = post("A", Some("a"));
        let collection = MemoryCollection::from_records(vec![p.clone(), p]);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.holders("a").len(), 1);
    }
}
