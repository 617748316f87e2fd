//! Post service
//!
//! Create, edit, delete, read-by-slug, listing and search for posts. Slug
//! assignment is delegated to [`IdentifierService`]; this module owns the
//! auth, ownership and validation rules around it.

use crate::auth::{ensure_owner, require_user, AuthProvider};
use crate::config::QuillConfig;
use crate::error::QuillError;
use crate::identifier::IdentifierService;
use quill_store::{Collection, Comment, EntityId, EntityKind, Post, PostPatch, User};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Input for [`PostService::create_post`]
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    /// Title (required)
    pub title: String,
    /// Optional subtitle
    pub subtitle: Option<String>,
    /// Body (required)
    pub body: String,
    /// Tags
    pub tags: Vec<String>,
    /// Publish immediately
    pub published: bool,
}

impl NewPost {
    /// Published post with title and body
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            published: true,
            ..Self::default()
        }
    }

    /// With subtitle
    #[inline]
    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// With tags
    #[inline]
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// As unpublished draft
    #[inline]
    #[must_use]
    pub fn draft(mut self) -> Self {
        self.published = false;
        self
    }
}

/// Input for [`PostService::update_post`]; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    /// New title
    pub title: Option<String>,
    /// New subtitle (`Some(None)` clears it)
    pub subtitle: Option<Option<String>>,
    /// New body
    pub body: Option<String>,
    /// New tags
    pub tags: Option<Vec<String>>,
    /// New published flag
    pub published: Option<bool>,
}

impl PostUpdate {
    /// Change title
    #[inline]
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Change body
    #[inline]
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Change published flag
    #[inline]
    #[must_use]
    pub fn published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }
}

/// Filter for [`PostService::list_posts`]
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Only posts by this author
    pub author: Option<EntityId>,
    /// Only posts carrying this tag (case-insensitive)
    pub tag: Option<String>,
    /// Page size, clamped by configuration
    pub limit: Option<usize>,
}

/// Post as returned to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    /// Token to address the post by
    pub slug: String,
    /// The post
    pub post: Post,
    /// Author profile, if registered
    pub author: Option<User>,
    /// Current user owns the post
    pub can_edit: bool,
    /// Post has no stored slug yet; call [`PostService::backfill_post`]
    pub needs_backfill: bool,
}

/// Post operations
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn Collection<Post>>,
    users: Arc<dyn Collection<User>>,
    comments: Arc<dyn Collection<Comment>>,
    auth: Arc<dyn AuthProvider>,
    slugs: IdentifierService<Post>,
    config: Arc<QuillConfig>,
}

impl PostService {
    /// Create service
    #[must_use]
    pub fn new(
        posts: Arc<dyn Collection<Post>>,
        users: Arc<dyn Collection<User>>,
        comments: Arc<dyn Collection<Comment>>,
        auth: Arc<dyn AuthProvider>,
        config: Arc<QuillConfig>,
    ) -> Self {
        Self {
            slugs: IdentifierService::new(Arc::clone(&posts), &config.identifiers),
            posts,
            users,
            comments,
            auth,
            config,
        }
    }

    /// Slug assignment for posts
    #[inline]
    #[must_use]
    pub fn slugs(&self) -> &IdentifierService<Post> {
        &self.slugs
    }

    /// Publish or save a new post as the current user
    ///
    /// # Errors
    /// `Unauthenticated`, `Validation` for empty title or body
    pub async fn create_post(&self, input: NewPost) -> Result<PostView, QuillError> {
        let author_id = require_user(self.auth.as_ref()).await?;
        let title = self.validate_title(&input.title)?;
        let body = validate_body(&input.body)?;

        let slug = self.slugs.assign_on_create(&title).await?;
        let mut post = Post::new(author_id, title, body)
            .with_slug(slug)
            .with_tags(clean_tags(input.tags))
            .with_published(input.published);
        post.subtitle = clean_optional(input.subtitle);

        self.posts.insert(post.clone()).await?;
        tracing::info!(
            "Created post {} as '{}'",
            post.id,
            post.slug.as_deref().unwrap_or_default()
        );
        self.view(post, Some(author_id)).await
    }

    /// Edit a post owned by the current user
    ///
    /// The slug is reassigned only when the title actually changes.
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound`, `NotAuthorized`, `Validation`
    pub async fn update_post(
        &self,
        id: EntityId,
        update: PostUpdate,
    ) -> Result<PostView, QuillError> {
        let current = require_user(self.auth.as_ref()).await?;
        let post = self.posts.require(id).await?;
        ensure_owner(post.author_id, current, "edit this post")?;

        let mut patch = PostPatch::default();
        if let Some(title) = update.title {
            let title = self.validate_title(&title)?;
            if title != post.title {
                patch.slug = Some(self.slugs.assign_on_rename(id, &title).await?);
                patch.title = Some(title);
            }
        }
        if let Some(body) = update.body {
            patch.body = Some(validate_body(&body)?);
        }
        patch.subtitle = update.subtitle.map(clean_optional);
        patch.tags = update.tags.map(clean_tags);
        patch.published = update.published;

        let updated = if patch.is_empty() {
            post
        } else {
            let updated = self.posts.patch(id, patch).await?;
            tracing::info!("Updated post {}", id);
            updated
        };
        self.view(updated, Some(current)).await
    }

    /// Delete a post owned by the current user, with its comments
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound`, `NotAuthorized`
    pub async fn delete_post(&self, id: EntityId) -> Result<(), QuillError> {
        let current = require_user(self.auth.as_ref()).await?;
        let post = self.posts.require(id).await?;
        ensure_owner(post.author_id, current, "delete this post")?;

        let mut removed = 0usize;
        for comment in self.comments.all().await? {
            if comment.post_id == id {
                self.comments.delete(comment.id).await?;
                removed += 1;
            }
        }
        self.posts.delete(id).await?;
        tracing::info!("Deleted post {} and {} comments", id, removed);
        Ok(())
    }

    /// Fetch a post by slug
    ///
    /// Legacy posts found through the fallback scan are backfilled in-line
    /// when `identifiers.backfill_on_read` is set; otherwise the view is
    /// flagged for the caller to do it. Drafts are visible to their author
    /// only.
    ///
    /// # Errors
    /// `NotFound`
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<PostView, QuillError> {
        let viewer = self.auth.current_user_id().await;
        let resolution = self.slugs.resolve_on_read(slug).await?;
        let mut post = resolution.record;

        if !post.published && viewer != Some(post.author_id) {
            return Err(QuillError::not_found(EntityKind::Post, slug));
        }

        if resolution.needs_backfill && self.config.identifiers.backfill_on_read {
            post.slug = Some(self.slugs.backfill(post.id).await?);
        }
        self.view(post, viewer).await
    }

    /// Persist the derived slug on a legacy post
    ///
    /// Idempotent; returns the stored slug.
    ///
    /// # Errors
    /// `NotFound`
    pub async fn backfill_post(&self, id: EntityId) -> Result<String, QuillError> {
        self.slugs.backfill(id).await
    }

    /// Published posts, newest first
    ///
    /// # Errors
    /// Store failures
    pub async fn list_posts(&self, query: ListQuery) -> Result<Vec<PostView>, QuillError> {
        let limit = self.config.listing.page_size(query.limit);
        let tag = query.tag.map(|t| t.trim().to_lowercase());

        let mut posts: Vec<Post> = self
            .posts
            .all()
            .await?
            .into_iter()
            .filter(|p| p.published)
            .filter(|p| query.author.map_or(true, |a| p.author_id == a))
            .filter(|p| {
                tag.as_ref()
                    .map_or(true, |t| p.tags.iter().any(|pt| pt.to_lowercase() == *t))
            })
            .collect();
        newest_first(&mut posts);
        posts.truncate(limit);

        self.views(posts).await
    }

    /// Case-insensitive substring search over published posts
    ///
    /// Scans title, subtitle, body and tags. An empty query matches nothing.
    ///
    /// # Errors
    /// Store failures
    pub async fn search_posts(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PostView>, QuillError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let limit = self.config.listing.page_size(limit);

        let mut hits: Vec<Post> = self
            .posts
            .all()
            .await?
            .into_iter()
            .filter(|p| p.published && matches_query(p, &needle))
            .collect();
        newest_first(&mut hits);
        hits.truncate(limit);

        tracing::debug!("Search '{}' matched {} posts", needle, hits.len());
        self.views(hits).await
    }

    fn validate_title(&self, raw: &str) -> Result<String, QuillError> {
        let title = raw.trim();
        if title.is_empty() {
            return Err(QuillError::validation("title cannot be empty"));
        }
        let max = self.config.content.max_title_len;
        if title.chars().count() > max {
            return Err(QuillError::validation(format!("title cannot exceed {max} characters")));
        }
        Ok(title.to_string())
    }

    async fn view(&self, post: Post, viewer: Option<EntityId>) -> Result<PostView, QuillError> {
        let author = self.users.get(post.author_id).await?;
        Ok(self.view_with(post, author, viewer))
    }

    async fn views(&self, posts: Vec<Post>) -> Result<Vec<PostView>, QuillError> {
        let viewer = self.auth.current_user_id().await;
        let mut authors: HashMap<EntityId, Option<User>> = HashMap::new();
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            let author = match authors.get(&post.author_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.users.get(post.author_id).await?;
                    authors.insert(post.author_id, fetched.clone());
                    fetched
                }
            };
            views.push(self.view_with(post, author, viewer));
        }
        Ok(views)
    }

    fn view_with(&self, post: Post, author: Option<User>, viewer: Option<EntityId>) -> PostView {
        PostView {
            slug: self.slugs.effective_token(&post),
            needs_backfill: post.slug.is_none(),
            can_edit: viewer == Some(post.author_id),
            author,
            post,
        }
    }
}

fn validate_body(raw: &str) -> Result<String, QuillError> {
    if raw.trim().is_empty() {
        return Err(QuillError::validation("body cannot be empty"));
    }
    Ok(raw.to_string())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim, drop empties and repeats (case-insensitive), keep first spelling
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn matches_query(post: &Post, needle: &str) -> bool {
    post.title.to_lowercase().contains(needle)
        || post
            .subtitle
            .as_ref()
            .is_some_and(|s| s.to_lowercase().contains(needle))
        || post.body.to_lowercase().contains(needle)
        || post.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_tags_dedupes_case_insensitively() {
        let tags = clean_tags(vec![" Rust ".into(), "rust".into(), "".into(), "Async".into()]);
        assert_eq!(tags, vec!["Rust".to_string(), "Async".to_string()]);
    }

    #[test]
    fn clean_optional_drops_blank() {
        assert_eq!(clean_optional(Some("  ".into())), None);
        assert_eq!(clean_optional(Some(" x ".into())), Some("x".into()));
    }

    #[test]
    fn query_matches_any_field() {
        let post = Post::new(EntityId::new(), "Ownership", "Borrowing rules")
            .with_subtitle("A primer")
            .with_tags(vec!["Memory".into()]);

        assert!(matches_query(&post, "owner"));
        assert!(matches_query(&post, "primer"));
        assert!(matches_query(&post, "borrow"));
        assert!(matches_query(&post, "memory"));
        assert!(!matches_query(&post, "lifetimes"));
    }

    #[test]
    fn body_validation() {
        assert!(validate_body("  \n ").is_err());
        assert_eq!(validate_body("text").unwrap(), "text");
    }
}
