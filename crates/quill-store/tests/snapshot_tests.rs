//! Snapshot load/save against the in-memory store.

use pretty_assertions::assert_eq;
use quill_store::{Collection, EntityId, MemoryStore, Post, Snapshot, StoreError, User};

#[tokio::test]
async fn store_survives_snapshot_file() {
    let store = MemoryStore::new();
    let author = User::new(EntityId::new()).with_name("Ada").with_username("ada");
    store.users.insert(author.clone()).await.unwrap();
    store
        .posts
        .insert(Post::new(author.id, "Hello", "World").with_slug("hello"))
        .await
        .unwrap();
    store
        .posts
        .insert(Post::new(author.id, "Legacy", "No slug"))
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quill.json");
    store.snapshot().save(&path).unwrap();

    let restored = MemoryStore::from_snapshot(Snapshot::load(&path).unwrap());

    assert_eq!(restored.snapshot(), store.snapshot());
    assert!(restored.posts.find_by_token("hello").await.unwrap().is_some());
    assert_eq!(restored.users.find_by_token("ada").await.unwrap(), Some(author));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Snapshot::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}

#[test]
fn malformed_json_is_format_error() {
    let err = Snapshot::from_json("{\"posts\": 3}").unwrap_err();
    assert!(matches!(err, StoreError::Format(_)));
}

#[test]
fn empty_object_is_empty_snapshot() {
    assert_eq!(Snapshot::from_json("{}").unwrap(), Snapshot::default());
}
