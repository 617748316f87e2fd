//! Auth collaborator
//!
//! Session issuance lives outside Quill. Services only ask who the current
//! user is and compare that against record owners.

use crate::error::QuillError;
use parking_lot::RwLock;
use quill_store::EntityId;

/// Source of the current user's id
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Id of the signed-in user, if any
    async fn current_user_id(&self) -> Option<EntityId>;
}

/// Fixed identity, switchable at runtime
///
/// Used by the admin tool and tests; a web handler would implement
/// [`AuthProvider`] over its session instead.
#[derive(Debug, Default)]
pub struct StaticAuth {
    current: RwLock<Option<EntityId>>,
}

impl StaticAuth {
    /// Nobody signed in
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Signed in as `id`
    #[inline]
    #[must_use]
    pub fn signed_in(id: EntityId) -> Self {
        Self {
            current: RwLock::new(Some(id)),
        }
    }

    /// Switch to `id`
    #[inline]
    pub fn sign_in(&self, id: EntityId) {
        *self.current.write() = Some(id);
    }

    /// Drop the current identity
    #[inline]
    pub fn sign_out(&self) {
        *self.current.write() = None;
    }
}

#[async_trait::async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user_id(&self) -> Option<EntityId> {
        *self.current.read()
    }
}

/// Current user id or `Unauthenticated`
pub(crate) async fn require_user(auth: &dyn AuthProvider) -> Result<EntityId, QuillError> {
    auth.current_user_id().await.ok_or(QuillError::Unauthenticated)
}

/// Reject writes by anyone but the owner
pub(crate) fn ensure_owner(
    owner: EntityId,
    current: EntityId,
    action: &str,
) -> Result<(), QuillError> {
    if owner == current {
        Ok(())
    } else {
        tracing::warn!("User {} denied: {}", current, action);
        Err(QuillError::not_authorized(action))
    }
}
