//! Testing utilities for Quill workspace
//!
//! Shared fixtures: seeded stores, signed-in auth and legacy records.

#![allow(missing_docs)]

use quill_core::{Quill, QuillConfig, StaticAuth};
use quill_store::{EntityId, MemoryStore, Post, Snapshot, User};
use std::sync::Arc;

/// Services over a fresh store, with a handle to switch the signed-in user
pub struct TestQuill {
    pub quill: Quill,
    pub store: MemoryStore,
    pub auth: Arc<StaticAuth>,
}

impl TestQuill {
    pub fn sign_in(&self, id: EntityId) {
        self.auth.sign_in(id);
    }

    pub fn sign_out(&self) {
        self.auth.sign_out();
    }
}

pub fn setup_quill() -> TestQuill {
    setup_quill_with(MemoryStore::new(), QuillConfig::new())
}

pub fn setup_quill_with(store: MemoryStore, config: QuillConfig) -> TestQuill {
    let auth = Arc::new(StaticAuth::anonymous());
    let quill = Quill::in_memory(&store, auth.clone(), config).unwrap();
    TestQuill { quill, store, auth }
}

/// Published post stored without a slug, as written before slugs existed
pub fn legacy_post(author_id: EntityId, title: &str) -> Post {
    Post::new(author_id, title, "legacy body")
}

/// Profile stored without a username
pub fn legacy_user(name: &str) -> User {
    User::new(EntityId::new()).with_name(name)
}

pub fn create_test_user(name: &str, username: &str) -> User {
    User::new(EntityId::new()).with_name(name).with_username(username)
}

/// Store holding one author, a slugged post and two legacy posts
///
/// Legacy titles are "Hello World!!!" and "Hello World", which both
/// normalize to `hello-world`.
pub fn legacy_snapshot() -> (Snapshot, User) {
    let author = create_test_user("Ada Lovelace", "ada-lovelace");
    let snapshot = Snapshot {
        posts: vec![
            Post::new(author.id, "Notes", "on the engine").with_slug("notes"),
            legacy_post(author.id, "Hello World!!!"),
            legacy_post(author.id, "Hello World"),
        ],
        users: vec![author.clone(), legacy_user("Grace Hopper")],
        comments: Vec::new(),
    };
    (snapshot, author)
}
