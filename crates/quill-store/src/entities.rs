//! Persisted records
//!
//! Defines [`Post`], [`User`] and [`Comment`], their typed patches, and the
//! [`Record`] / [`Sluggable`] traits the store and the identifier service
//! are written against.

use crate::id::{EntityId, EntityKind};
use chrono::{DateTime, Utc};
use quill_slug::SlugKind;
use serde::{Deserialize, Serialize};

/// A record stored in a [`Collection`](crate::Collection)
pub trait Record: Clone + Send + Sync + 'static {
    /// Typed partial update
    type Patch: Send + 'static;

    /// Kind of record
    const KIND: EntityKind;

    /// Record id
    fn id(&self) -> EntityId;

    /// Stored URL token, if the record kind carries one
    fn token(&self) -> Option<&str> {
        None
    }

    /// Apply a patch in place
    fn apply(&mut self, patch: Self::Patch);
}

/// A record whose token is derived from a display text
///
/// Posts derive their slug from the title, users their username from the
/// display name.
pub trait Sluggable: Record {
    /// Slug kind, decides the fallback token
    const SLUG_KIND: SlugKind;

    /// Text the token is derived from
    fn source_text(&self) -> Option<&str>;

    /// Patch that stores `token` on the record
    fn token_patch(token: String) -> Self::Patch;
}

/// Blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Post id
    pub id: EntityId,
    /// Owning user
    pub author_id: EntityId,
    /// Display title
    pub title: String,
    /// Optional subtitle
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Rich-text body (opaque to this crate)
    pub body: String,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Stored slug; absent on legacy posts
    #[serde(default)]
    pub slug: Option<String>,
    /// Visible in listings
    #[serde(default = "default_published")]
    pub published: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

fn default_published() -> bool {
    true
}

impl Post {
    /// Create new published post without a slug
    #[must_use]
    pub fn new(author_id: EntityId, title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(),
            author_id,
            title: title.into(),
            subtitle: None,
            body: body.into(),
            tags: Vec::new(),
            slug: None,
            published: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// With slug
    #[inline]
    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
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
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// With published flag
    #[inline]
    #[must_use]
    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }
}

/// Partial update for [`Post`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPatch {
    /// New title
    pub title: Option<String>,
    /// New subtitle (`Some(None)` clears it)
    pub subtitle: Option<Option<String>>,
    /// New body
    pub body: Option<String>,
    /// New tags
    pub tags: Option<Vec<String>>,
    /// New slug
    pub slug: Option<String>,
    /// New published flag
    pub published: Option<bool>,
}

impl PostPatch {
    /// Set title
    #[inline]
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set slug
    #[inline]
    #[must_use]
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Set body
    #[inline]
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// True when the patch changes nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Record for Post {
    type Patch = PostPatch;
    const KIND: EntityKind = EntityKind::Post;

    fn id(&self) -> EntityId {
        self.id
    }

    fn token(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn apply(&mut self, patch: PostPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(subtitle) = patch.subtitle {
            self.subtitle = subtitle;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(slug) = patch.slug {
            self.slug = Some(slug);
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        self.updated_at = Utc::now();
    }
}

impl Sluggable for Post {
    const SLUG_KIND: SlugKind = SlugKind::Post;

    fn source_text(&self) -> Option<&str> {
        Some(&self.title)
    }

    fn token_patch(token: String) -> PostPatch {
        PostPatch::default().slug(token)
    }
}

/// User profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User id (issued by the auth platform)
    pub id: EntityId,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Stored username; absent on legacy profiles
    #[serde(default)]
    pub username: Option<String>,
    /// Short biography
    #[serde(default)]
    pub bio: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create profile for an authenticated id
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            name: None,
            username: None,
            bio: None,
            created_at: Utc::now(),
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With username
    #[inline]
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Partial update for [`User`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    /// New display name (`Some(None)` clears it)
    pub name: Option<Option<String>>,
    /// New username
    pub username: Option<String>,
    /// New bio (`Some(None)` clears it)
    pub bio: Option<Option<String>>,
}

impl UserPatch {
    /// Set username
    #[inline]
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl Record for User {
    type Patch = UserPatch;
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> EntityId {
        self.id
    }

    fn token(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(username) = patch.username {
            self.username = Some(username);
        }
        if let Some(bio) = patch.bio {
            self.bio = bio;
        }
    }
}

impl Sluggable for User {
    const SLUG_KIND: SlugKind = SlugKind::User;

    fn source_text(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn token_patch(token: String) -> UserPatch {
        UserPatch::default().username(token)
    }
}

/// Comment on a post, optionally replying to another comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id
    pub id: EntityId,
    /// Post commented on
    pub post_id: EntityId,
    /// Comment author
    pub author_id: EntityId,
    /// Parent comment for replies
    #[serde(default)]
    pub parent_id: Option<EntityId>,
    /// Comment text
    pub body: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create new comment
    #[must_use]
    pub fn new(post_id: EntityId, author_id: EntityId, body: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            post_id,
            author_id,
            parent_id: None,
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    /// As reply to `parent_id`
    #[inline]
    #[must_use]
    pub fn reply_to(mut self, parent_id: EntityId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Partial update for [`Comment`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentPatch {
    /// New body
    pub body: Option<String>,
}

impl Record for Comment {
    type Patch = CommentPatch;
    const KIND: EntityKind = EntityKind::Comment;

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, patch: CommentPatch) {
        if let Some(body) = patch.body {
            self.body = body;
        }
    }
}
