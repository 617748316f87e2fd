use pretty_assertions::assert_eq;
use quill_core::{friendly_message, NewPost, ProfileUpdate, QuillConfig, QuillError};
use quill_store::{Collection, EntityId, MemoryStore};
use quill_test_utils::{create_test_user, legacy_snapshot, setup_quill, setup_quill_with};

#[tokio::test]
async fn test_register_derives_unique_usernames() {
    let t = setup_quill();

    t.sign_in(EntityId::new());
    let first = t.quill.users().register(Some("Ada Lovelace")).await.unwrap();
    t.sign_in(EntityId::new());
    let second = t.quill.users().register(Some("ada lovelace")).await.unwrap();
    t.sign_in(EntityId::new());
    let nameless = t.quill.users().register(None).await.unwrap();

    assert_eq!(first.username.as_deref(), Some("ada-lovelace"));
    assert_eq!(second.username.as_deref(), Some("ada-lovelace-1"));
    assert_eq!(nameless.username.as_deref(), Some("user"));
}

#[tokio::test]
async fn test_register_is_idempotent() {
    let t = setup_quill();
    t.sign_in(EntityId::new());

    let first = t.quill.users().register(Some("Ada")).await.unwrap();
    let again = t.quill.users().register(Some("Someone Else")).await.unwrap();

    assert_eq!(first, again);
    assert_eq!(t.store.users.len(), 1);
}

#[tokio::test]
async fn test_rename_rederives_username() {
    let t = setup_quill();
    t.sign_in(EntityId::new());
    t.quill.users().register(Some("Ada")).await.unwrap();

    let updated = t
        .quill
        .users()
        .update_profile(ProfileUpdate::default().name("Ada King").bio("Countess"))
        .await
        .unwrap();

    assert_eq!(updated.username.as_deref(), Some("ada-king"));
    assert_eq!(updated.bio.as_deref(), Some("Countess"));
    assert!(t.quill.users().get_by_username("ada").await.is_err());

    let view = t.quill.users().get_by_username("ada-king").await.unwrap();
    assert!(view.is_self);
}

#[tokio::test]
async fn test_bio_only_update_keeps_username() {
    let t = setup_quill();
    t.sign_in(EntityId::new());
    t.quill.users().register(Some("Ada")).await.unwrap();

    let updated = t
        .quill
        .users()
        .update_profile(ProfileUpdate::default().name("Ada").bio("Poet"))
        .await
        .unwrap();
    assert_eq!(updated.username.as_deref(), Some("ada"));
}

#[tokio::test]
async fn test_blank_name_rejected() {
    let t = setup_quill();
    t.sign_in(EntityId::new());
    t.quill.users().register(Some("Ada")).await.unwrap();

    let result = t.quill.users().update_profile(ProfileUpdate::default().name("  ")).await;
    assert!(matches!(result, Err(QuillError::Validation(_))));
}

#[tokio::test]
async fn test_set_username_validates_and_rejects_taken() {
    let t = setup_quill();
    let taken = create_test_user("Grace", "grace");
    t.store.users.insert(taken).await.unwrap();

    t.sign_in(EntityId::new());
    t.quill.users().register(Some("Ada")).await.unwrap();

    let bad = t.quill.users().set_username("a!").await;
    assert!(matches!(bad, Err(QuillError::Validation(_))));

    let err = t.quill.users().set_username("Grace").await.unwrap_err();
    assert_eq!(
        friendly_message(&err.to_string()),
        "That username is taken. Try another one."
    );

    let ok = t.quill.users().set_username("  The_Countess ").await.unwrap();
    assert_eq!(ok.username.as_deref(), Some("the_countess"));

    // claiming one's own username again is fine
    assert!(t.quill.users().set_username("the_countess").await.is_ok());
}

#[tokio::test]
async fn test_legacy_profile_backfilled_on_read() {
    let (snapshot, _) = legacy_snapshot();
    let t = setup_quill_with(MemoryStore::from_snapshot(snapshot), QuillConfig::new());

    let view = t.quill.users().get_by_username("grace-hopper").await.unwrap();
    assert_eq!(view.username, "grace-hopper");
    assert!(!view.needs_backfill);
    assert!(!view.is_self);

    let stored = t.store.users.find_by_token("grace-hopper").await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Grace Hopper"));
}

#[tokio::test]
async fn test_current_user_requires_registration() {
    let t = setup_quill();
    assert!(matches!(
        t.quill.users().current_user().await,
        Err(QuillError::Unauthenticated)
    ));

    t.sign_in(EntityId::new());
    assert!(matches!(
        t.quill.users().current_user().await,
        Err(QuillError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_comment_tree_nests_replies() {
    let t = setup_quill();
    let ada = EntityId::new();
    let grace = EntityId::new();

    t.sign_in(ada);
    t.quill.users().register(Some("Ada")).await.unwrap();
    let post = t.quill.posts().create_post(NewPost::new("Engines", "body")).await.unwrap();
    let root = t.quill.comments().add_comment(post.post.id, "Thoughts?", None).await.unwrap();

    t.sign_in(grace);
    let reply = t
        .quill
        .comments()
        .add_comment(post.post.id, "Lovely", Some(root.id))
        .await
        .unwrap();
    t.quill.comments().add_comment(post.post.id, "Second thread", None).await.unwrap();

    let tree = t.quill.comments().comment_tree(post.post.id).await.unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].comment.id, root.id);
    assert_eq!(tree[0].author.as_ref().and_then(|u| u.username.as_deref()), Some("ada"));
    assert_eq!(tree[0].replies.len(), 1);
    assert_eq!(tree[0].replies[0].comment.id, reply.id);
    assert_eq!(tree[0].replies[0].author, None);
}

#[tokio::test]
async fn test_comment_validation() {
    let t = setup_quill();
    t.sign_in(EntityId::new());
    let a = t.quill.posts().create_post(NewPost::new("A", "body")).await.unwrap();
    let b = t.quill.posts().create_post(NewPost::new("B", "body")).await.unwrap();
    let on_a = t.quill.comments().add_comment(a.post.id, "hi", None).await.unwrap();

    let empty = t.quill.comments().add_comment(a.post.id, "   ", None).await;
    assert!(matches!(empty, Err(QuillError::Validation(_))));

    let cross = t.quill.comments().add_comment(b.post.id, "hi", Some(on_a.id)).await;
    assert!(matches!(cross, Err(QuillError::Validation(_))));

    let missing_post = t.quill.comments().add_comment(EntityId::new(), "hi", None).await;
    assert!(matches!(missing_post, Err(QuillError::NotFound { .. })));

    let too_long = "x".repeat(t.quill.config().content.max_comment_len + 1);
    let long = t.quill.comments().add_comment(a.post.id, &too_long, None).await;
    assert!(matches!(long, Err(QuillError::Validation(_))));

    t.sign_out();
    let anonymous = t.quill.comments().add_comment(a.post.id, "hi", None).await;
    assert!(matches!(anonymous, Err(QuillError::Unauthenticated)));
}

#[tokio::test]
async fn test_delete_comment_cascades_to_replies() {
    let t = setup_quill();
    let ada = EntityId::new();
    t.sign_in(ada);
    let post = t.quill.posts().create_post(NewPost::new("Thread", "body")).await.unwrap();
    let root = t.quill.comments().add_comment(post.post.id, "root", None).await.unwrap();
    let reply = t
        .quill
        .comments()
        .add_comment(post.post.id, "reply", Some(root.id))
        .await
        .unwrap();
    t.quill
        .comments()
        .add_comment(post.post.id, "nested", Some(reply.id))
        .await
        .unwrap();
    let other = t.quill.comments().add_comment(post.post.id, "other", None).await.unwrap();

    t.sign_in(EntityId::new());
    let denied = t.quill.comments().delete_comment(root.id).await;
    assert!(matches!(denied, Err(QuillError::NotAuthorized { .. })));

    t.sign_in(ada);
    let removed = t.quill.comments().delete_comment(root.id).await.unwrap();
    assert_eq!(removed, 3);

    let tree = t.quill.comments().comment_tree(post.post.id).await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].comment.id, other.id);
}

#[tokio::test]
async fn test_comment_tree_of_missing_post() {
    let t = setup_quill();
    let result = t.quill.comments().comment_tree(EntityId::new()).await;
    assert!(matches!(result, Err(QuillError::NotFound { .. })));
}
