//! Error types for Quill Core
//!
//! Every failure surfaces synchronously to the caller of a service
//! operation. Nothing here is retried: collision handling inside the
//! resolver is part of the algorithm, not error recovery.

use quill_store::{EntityKind, StoreError};

/// Main Quill error type
#[derive(Debug, thiserror::Error)]
pub enum QuillError {
    /// No current user
    #[error("not authenticated")]
    Unauthenticated,

    /// Current user does not own the record
    #[error("not authorized to {action}")]
    NotAuthorized {
        /// Attempted action, e.g. "edit this post"
        action: String,
    },

    /// Referenced record does not exist
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Kind of record looked up
        kind: EntityKind,
        /// Id or token used for the lookup
        key: String,
    },

    /// Input rejected before any identifier work ran
    #[error("validation failed: {0}")]
    Validation(String),

    /// Storage collaborator failure
    #[error("store error: {0}")]
    Store(#[source] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl QuillError {
    /// Not-found error for a kind and lookup key
    #[inline]
    pub fn not_found(kind: EntityKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Not-authorized error for an action
    #[inline]
    pub fn not_authorized(action: impl Into<String>) -> Self {
        Self::NotAuthorized {
            action: action.into(),
        }
    }

    /// Validation error
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if the caller is at fault (as opposed to the platform)
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Config(_))
    }

    /// Message suitable for showing to an end user
    #[must_use]
    pub fn user_message(&self) -> String {
        friendly_message(&self.to_string())
    }
}

impl From<StoreError> for QuillError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => Self::not_found(kind, id),
            other => Self::Store(other),
        }
    }
}

/// Known message fragments and their user-facing text
const FRIENDLY: &[(&str, &str)] = &[
    ("not authenticated", "Please sign in to continue."),
    ("not authorized", "You don't have permission to do that."),
    ("post not found", "We couldn't find that story."),
    ("user not found", "We couldn't find that writer."),
    ("comment not found", "That comment no longer exists."),
    ("username already taken", "That username is taken. Try another one."),
    ("title cannot be empty", "Give your story a title before publishing."),
    ("body cannot be empty", "Your story needs some content."),
    ("comment cannot be empty", "Write something before posting a comment."),
];

/// Map a raw error message to friendlier text
///
/// Unrecognized messages are returned verbatim.
#[must_use]
pub fn friendly_message(raw: &str) -> String {
    FRIENDLY
        .iter()
        .find(|(needle, _)| raw.contains(needle))
        .map_or_else(|| raw.to_string(), |(_, friendly)| (*friendly).to_string())
}
