//! Uniqueness resolver
//!
//! Walks the [`Candidates`] sequence for a base token and returns the first
//! candidate the registry does not hold. A candidate held only by the
//! excluded id (the record being renamed) is free.
//!
//! # Concurrency
//!
//! The existence check and the caller's later write are separate store
//! calls. Two concurrent creations with the same base can both see the
//! base as free and both persist it. That race is accepted; duplicates are
//! reported by [`IdentifierService::find_duplicates`](crate::IdentifierService::find_duplicates).

use crate::error::QuillError;
use quill_slug::{fallback_token, Candidate, Candidates, DEFAULT_MAX_ATTEMPTS};
use quill_store::{Collection, EntityId, Record};

/// Finds a free token by appending numeric suffixes
#[derive(Debug, Clone, Copy)]
pub struct UniquenessResolver {
    max_attempts: u32,
}

impl UniquenessResolver {
    /// Create resolver with an attempt bound
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Attempt bound
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Resolve `base` against `registry`
    ///
    /// Read-only: the caller persists the returned token.
    ///
    /// # Errors
    /// Only store failures; the search itself always terminates with a
    /// token.
    pub async fn resolve<R: Record>(
        &self,
        base: &str,
        registry: &dyn Collection<R>,
        exclude: Option<EntityId>,
    ) -> Result<String, QuillError> {
        for candidate in Candidates::new(base, self.max_attempts) {
            let token = match candidate {
                Candidate::Fallback(token) => {
                    tracing::warn!(
                        "No free {} token for '{}' after {} attempts, using {}",
                        R::KIND,
                        base,
                        self.max_attempts,
                        token
                    );
                    return Ok(token);
                }
                Candidate::Checked(token) => token,
            };

            match registry.find_by_token(&token).await? {
                Some(holder) if Some(holder.id()) != exclude => {
                    tracing::debug!("{} token '{}' held by {}", R::KIND, token, holder.id());
                }
                _ => return Ok(token),
            }
        }

        // Candidates always ends with a fallback
        Ok(fallback_token(base, chrono::Utc::now().timestamp_millis()))
    }
}

impl Default for UniquenessResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_store::{MemoryCollection, Post};

    async fn seeded(slugs: &[&str]) -> MemoryCollection<Post> {
        let posts = MemoryCollection::new();
        for slug in slugs {
            posts
                .insert(Post::new(EntityId::new(), *slug, "body").with_slug(*slug))
                .await
                .unwrap();
        }
        posts
    }

    #[tokio::test]
    async fn free_base_is_returned() {
        let posts = seeded(&[]).await;
        let token = UniquenessResolver::default().resolve("hello", &posts, None).await.unwrap();
        assert_eq!(token, "hello");
    }

    #[tokio::test]
    async fn collisions_get_numeric_suffix() {
        let posts = seeded(&["hello", "hello-1", "hello-2"]).await;
        let token = UniquenessResolver::default().resolve("hello", &posts, None).await.unwrap();
        assert_eq!(token, "hello-3");
    }

    #[tokio::test]
    async fn gaps_are_reused() {
        let posts = seeded(&["hello", "hello-2"]).await;
        let token = UniquenessResolver::default().resolve("hello", &posts, None).await.unwrap();
        assert_eq!(token, "hello-1");
    }

    #[tokio::test]
    async fn excluded_holder_is_not_a_collision() {
        let posts = seeded(&["hello"]).await;
        let holder = posts.find_by_token("hello").await.unwrap().unwrap();

        let token = UniquenessResolver::default()
            .resolve("hello", &posts, Some(holder.id))
            .await
            .unwrap();
        assert_eq!(token, "hello");
    }

    #[tokio::test]
    async fn bound_falls_back_to_timestamp() {
        let posts = seeded(&["x", "x-1", "x-2"]).await;
        let token = UniquenessResolver::new(3).resolve("x", &posts, None).await.unwrap();

        let suffix = token.strip_prefix("x-").unwrap();
        assert!(suffix.parse::<i64>().unwrap() > 1_600_000_000_000);
        assert!(posts.find_by_token(&token).await.unwrap().is_none());
    }
}
