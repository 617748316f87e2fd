//! Service facade
//!
//! Wires the three services over one set of collections, one auth provider
//! and one configuration.

use crate::auth::AuthProvider;
use crate::comments::CommentService;
use crate::config::QuillConfig;
use crate::error::QuillError;
use crate::identifier::{BackfillReport, DuplicateToken};
use crate::posts::PostService;
use crate::users::UserService;
use quill_store::{Collection, Comment, MemoryStore, Post, User};
use std::sync::Arc;

/// Storage collaborators, one per record kind
#[derive(Clone)]
pub struct Collections {
    /// Posts, keyed by slug
    pub posts: Arc<dyn Collection<Post>>,
    /// Profiles, keyed by username
    pub users: Arc<dyn Collection<User>>,
    /// Comments
    pub comments: Arc<dyn Collection<Comment>>,
}

impl From<&MemoryStore> for Collections {
    fn from(store: &MemoryStore) -> Self {
        Self {
            posts: store.posts.clone(),
            users: store.users.clone(),
            comments: store.comments.clone(),
        }
    }
}

/// Totals from [`Quill::backfill_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BackfillSummary {
    /// Post pass
    pub posts: BackfillReport,
    /// Profile pass
    pub users: BackfillReport,
}

impl BackfillSummary {
    /// Records that received a token in this run
    #[must_use]
    pub fn assigned(&self) -> usize {
        self.posts.assigned.len() + self.users.assigned.len()
    }
}

/// Tokens held by more than one record
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AuditReport {
    /// Duplicate post slugs
    pub posts: Vec<DuplicateToken>,
    /// Duplicate usernames
    pub users: Vec<DuplicateToken>,
}

impl AuditReport {
    /// No token is shared
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.posts.is_empty() && self.users.is_empty()
    }
}

/// Blog services
#[derive(Clone)]
pub struct Quill {
    posts: PostService,
    users: UserService,
    comments: CommentService,
    config: Arc<QuillConfig>,
}

impl Quill {
    /// Wire services over arbitrary collections
    ///
    /// # Errors
    /// `Config` if the configuration is invalid
    pub fn new(
        collections: Collections,
        auth: Arc<dyn AuthProvider>,
        config: QuillConfig,
    ) -> Result<Self, QuillError> {
        config.validate()?;
        let config = Arc::new(config);

        let posts = PostService::new(
            Arc::clone(&collections.posts),
            Arc::clone(&collections.users),
            Arc::clone(&collections.comments),
            Arc::clone(&auth),
            Arc::clone(&config),
        );
        let users = UserService::new(
            Arc::clone(&collections.users),
            Arc::clone(&auth),
            Arc::clone(&config),
        );
        let comments = CommentService::new(
            collections.comments,
            collections.posts,
            collections.users,
            auth,
            Arc::clone(&config),
        );

        tracing::info!(
            "Quill services ready (max_attempts={}, backfill_on_read={})",
            config.identifiers.max_attempts,
            config.identifiers.backfill_on_read
        );
        Ok(Self {
            posts,
            users,
            comments,
            config,
        })
    }

    /// Wire services over an in-memory store
    ///
    /// # Errors
    /// `Config` if the configuration is invalid
    pub fn in_memory(
        store: &MemoryStore,
        auth: Arc<dyn AuthProvider>,
        config: QuillConfig,
    ) -> Result<Self, QuillError> {
        Self::new(Collections::from(store), auth, config)
    }

    /// Post operations
    #[inline]
    #[must_use]
    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    /// Profile operations
    #[inline]
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.users
    }

    /// Comment operations
    #[inline]
    #[must_use]
    pub fn comments(&self) -> &CommentService {
        &self.comments
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &QuillConfig {
        &self.config
    }

    /// Assign stored tokens to every legacy post and profile
    ///
    /// # Errors
    /// Storage failures
    pub async fn backfill_all(&self) -> Result<BackfillSummary, QuillError> {
        let posts = self.posts.slugs().backfill_all().await?;
        let users = self.users.usernames().backfill_all().await?;
        let summary = BackfillSummary { posts, users };
        tracing::info!("Backfill assigned {} tokens", summary.assigned());
        Ok(summary)
    }

    /// List tokens shared by more than one record
    ///
    /// # Errors
    /// Storage failures
    pub async fn audit(&self) -> Result<AuditReport, QuillError> {
        let report = AuditReport {
            posts: self.posts.slugs().find_duplicates().await?,
            users: self.users.usernames().find_duplicates().await?,
        };
        if !report.is_clean() {
            tracing::warn!(
                "Audit found {} duplicate slugs and {} duplicate usernames",
                report.posts.len(),
                report.users.len()
            );
        }
        Ok(report)
    }
}
