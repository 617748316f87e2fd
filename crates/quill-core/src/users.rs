//! User profile service
//!
//! Profiles are keyed by the id the auth platform issues. Usernames are
//! derived from the display name like post slugs are derived from titles,
//! and may be replaced by an explicit, validated choice.

use crate::auth::{require_user, AuthProvider};
use crate::config::QuillConfig;
use crate::error::QuillError;
use crate::identifier::IdentifierService;
use quill_slug::validate_username;
use quill_store::{Collection, EntityId, EntityKind, User, UserPatch};
use serde::Serialize;
use std::sync::Arc;

/// Input for [`UserService::update_profile`]
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name
    pub name: Option<String>,
    /// New bio (`Some(None)` clears it)
    pub bio: Option<Option<String>>,
}

impl ProfileUpdate {
    /// Change display name
    #[inline]
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Change bio
    #[inline]
    #[must_use]
    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(Some(bio.into()));
        self
    }
}

/// Profile as returned to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    /// Token to address the profile by
    pub username: String,
    /// The profile
    pub user: User,
    /// Profile belongs to the current user
    pub is_self: bool,
    /// Profile has no stored username yet
    pub needs_backfill: bool,
}

/// Profile operations
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn Collection<User>>,
    auth: Arc<dyn AuthProvider>,
    usernames: IdentifierService<User>,
    config: Arc<QuillConfig>,
}

impl UserService {
    /// Create service
    #[must_use]
    pub fn new(
        users: Arc<dyn Collection<User>>,
        auth: Arc<dyn AuthProvider>,
        config: Arc<QuillConfig>,
    ) -> Self {
        Self {
            usernames: IdentifierService::new(Arc::clone(&users), &config.identifiers),
            users,
            auth,
            config,
        }
    }

    /// Username assignment for users
    #[inline]
    #[must_use]
    pub fn usernames(&self) -> &IdentifierService<User> {
        &self.usernames
    }

    /// Create the current user's profile if it does not exist yet
    ///
    /// Returns the existing profile unchanged otherwise.
    ///
    /// # Errors
    /// `Unauthenticated`
    pub async fn register(&self, name: Option<&str>) -> Result<User, QuillError> {
        let id = require_user(self.auth.as_ref()).await?;
        if let Some(existing) = self.users.get(id).await? {
            return Ok(existing);
        }

        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let username = self.usernames.assign_on_create(name.unwrap_or_default()).await?;
        let mut user = User::new(id).with_username(username);
        user.name = name.map(str::to_string);

        self.users.insert(user.clone()).await?;
        tracing::info!(
            "Registered user {} as '{}'",
            id,
            user.username.as_deref().unwrap_or_default()
        );
        Ok(user)
    }

    /// The current user's profile
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound` if not registered
    pub async fn current_user(&self) -> Result<User, QuillError> {
        let id = require_user(self.auth.as_ref()).await?;
        Ok(self.users.require(id).await?)
    }

    /// Edit the current user's profile
    ///
    /// A changed display name re-derives the username.
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound`, `Validation` for a blank name
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User, QuillError> {
        let id = require_user(self.auth.as_ref()).await?;
        let user = self.users.require(id).await?;

        let mut patch = UserPatch::default();
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(QuillError::validation("name cannot be empty"));
            }
            if user.name.as_deref() != Some(name) {
                patch.username = Some(self.usernames.assign_on_rename(id, name).await?);
                patch.name = Some(Some(name.to_string()));
            }
        }
        patch.bio = update
            .bio
            .map(|bio| bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()));

        if patch == UserPatch::default() {
            return Ok(user);
        }
        let updated = self.users.patch(id, patch).await?;
        tracing::info!("Updated profile {}", id);
        Ok(updated)
    }

    /// Claim an explicit username for the current user
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound`, `Validation` for malformed or taken
    /// usernames
    pub async fn set_username(&self, raw: &str) -> Result<User, QuillError> {
        let id = require_user(self.auth.as_ref()).await?;
        let username = validate_username(raw).map_err(|e| QuillError::validation(e.to_string()))?;
        self.users.require(id).await?;

        if let Some(holder) = self.users.find_by_token(&username).await? {
            if holder.id != id {
                return Err(QuillError::validation("username already taken"));
            }
        }

        let updated = self
            .users
            .patch(id, UserPatch::default().username(username))
            .await?;
        tracing::info!(
            "User {} set username '{}'",
            id,
            updated.username.as_deref().unwrap_or_default()
        );
        Ok(updated)
    }

    /// Fetch a profile by username
    ///
    /// Legacy profiles are backfilled like legacy posts.
    ///
    /// # Errors
    /// `NotFound`
    pub async fn get_by_username(&self, username: &str) -> Result<ProfileView, QuillError> {
        let viewer = self.auth.current_user_id().await;
        let resolution = self.usernames.resolve_on_read(username).await?;
        let mut user = resolution.record;
        let mut token = resolution.token;
        let mut needs_backfill = resolution.needs_backfill;

        if needs_backfill && self.config.identifiers.backfill_on_read {
            token = self.usernames.backfill(user.id).await?;
            user.username = Some(token.clone());
            needs_backfill = false;
        }

        Ok(ProfileView {
            username: token,
            is_self: viewer == Some(user.id),
            user,
            needs_backfill,
        })
    }

    /// Persist the derived username on a legacy profile
    ///
    /// # Errors
    /// `NotFound`
    pub async fn backfill_user(&self, id: EntityId) -> Result<String, QuillError> {
        self.usernames.backfill(id).await
    }

    /// Fetch a profile by id
    ///
    /// # Errors
    /// `NotFound`
    pub async fn get(&self, id: EntityId) -> Result<User, QuillError> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| QuillError::not_found(EntityKind::User, id))
    }
}
