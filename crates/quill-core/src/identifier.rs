//! Identifier assignment service
//!
//! Orchestrates normalization and uniqueness for one sluggable record kind:
//! - assignment at creation
//! - reassignment when the source text changes
//! - token resolution on read, with fallback scans for legacy records that
//!   were created before tokens were stored
//! - lazy and eager backfill of those legacy records
//!
//! The service never owns records. It reads and writes through the
//! [`Collection`] it was given.

use crate::config::IdentifierConfig;
use crate::error::QuillError;
use crate::resolver::UniquenessResolver;
use quill_slug::normalize_or;
use quill_store::{Collection, EntityId, Sluggable};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Token lifecycle of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlugState {
    /// No stored token (legacy record)
    Unassigned,
    /// Token stored
    Assigned,
}

impl SlugState {
    /// Current state of `record`
    #[inline]
    #[must_use]
    pub fn of<R: Sluggable>(record: &R) -> Self {
        if record.token().is_some() {
            Self::Assigned
        } else {
            Self::Unassigned
        }
    }
}

/// Outcome of [`IdentifierService::resolve_on_read`]
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<R> {
    /// Matched record
    pub record: R,
    /// Token the record is addressed by (stored, or derived for legacy records)
    pub token: String,
    /// The record has no stored token and should be backfilled
    pub needs_backfill: bool,
}

/// Summary of [`IdentifierService::backfill_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Records examined
    pub scanned: usize,
    /// Records that already had a token
    pub already_assigned: usize,
    /// Newly assigned tokens
    pub assigned: Vec<(EntityId, String)>,
}

/// Token held by more than one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateToken {
    /// The shared token
    pub token: String,
    /// Holders, oldest first
    pub holders: Vec<EntityId>,
}

/// Assigns and resolves tokens for one record kind
pub struct IdentifierService<R: Sluggable> {
    registry: Arc<dyn Collection<R>>,
    resolver: UniquenessResolver,
    fallback: String,
}

impl<R: Sluggable> Clone for IdentifierService<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            resolver: self.resolver,
            fallback: self.fallback.clone(),
        }
    }
}

impl<R: Sluggable> IdentifierService<R> {
    /// Create service over `registry`
    #[must_use]
    pub fn new(registry: Arc<dyn Collection<R>>, config: &IdentifierConfig) -> Self {
        Self {
            registry,
            resolver: UniquenessResolver::new(config.max_attempts),
            fallback: config.fallback(R::SLUG_KIND).to_string(),
        }
    }

    /// Normalized base token for a source text
    #[inline]
    #[must_use]
    pub fn base_token(&self, text: Option<&str>) -> String {
        normalize_or(text.unwrap_or_default(), &self.fallback)
    }

    /// Token a record is addressed by: stored, or derived from its text
    #[inline]
    #[must_use]
    pub fn effective_token(&self, record: &R) -> String {
        record
            .token()
            .map_or_else(|| self.base_token(record.source_text()), str::to_string)
    }

    /// Token for a new record titled `title`
    ///
    /// The caller persists it together with the record.
    ///
    /// # Errors
    /// Store failures only
    pub async fn assign_on_create(&self, title: &str) -> Result<String, QuillError> {
        let base = self.base_token(Some(title));
        let token = self.resolver.resolve(&base, self.registry.as_ref(), None).await?;
        tracing::debug!("Assigned {} token '{}' for new record", R::KIND, token);
        Ok(token)
    }

    /// Token for record `id` after its text changes to `new_title`
    ///
    /// Uses the base directly when it is free or already held by `id`;
    /// runs the full resolver only on a real conflict.
    ///
    /// # Errors
    /// Store failures only
    pub async fn assign_on_rename(
        &self,
        id: EntityId,
        new_title: &str,
    ) -> Result<String, QuillError> {
        let base = self.base_token(Some(new_title));
        match self.registry.find_by_token(&base).await? {
            Some(holder) if holder.id() != id => {
                let token = self.resolver.resolve(&base, self.registry.as_ref(), Some(id)).await?;
                tracing::debug!("Reassigned {} {} to '{}' after conflict", R::KIND, id, token);
                Ok(token)
            }
            _ => Ok(base),
        }
    }

    /// Find the record addressed by `token`
    ///
    /// Tries the token index, then a scan matching stored tokens or the
    /// derived token of legacy records, then the same scan ignoring case.
    ///
    /// # Errors
    /// `QuillError::NotFound` once every fallback is exhausted
    pub async fn resolve_on_read(&self, token: &str) -> Result<Resolution<R>, QuillError> {
        if let Some(record) = self.registry.find_by_token(token).await? {
            return Ok(self.resolution(record));
        }

        tracing::debug!("{} token '{}' not indexed, scanning", R::KIND, token);
        let all = self.registry.all().await?;

        let exact = all.iter().find(|r| match r.token() {
            Some(stored) => stored == token,
            None => self.base_token(r.source_text()) == token,
        });
        if let Some(record) = exact {
            return Ok(self.resolution(record.clone()));
        }

        let lowered = token.to_lowercase();
        let folded = all.iter().find(|r| match r.token() {
            Some(stored) => stored.to_lowercase() == lowered,
            None => self.base_token(r.source_text()) == lowered,
        });
        match folded {
            Some(record) => Ok(self.resolution(record.clone())),
            None => Err(QuillError::not_found(R::KIND, token)),
        }
    }

    fn resolution(&self, record: R) -> Resolution<R> {
        let needs_backfill = record.token().is_none();
        Resolution {
            token: self.effective_token(&record),
            record,
            needs_backfill,
        }
    }

    /// Persist a token on record `id` if it has none
    ///
    /// Returns the stored token. Collisions with tokens assigned since the
    /// record was created are resolved like a rename.
    ///
    /// # Errors
    /// `QuillError::NotFound` if the record is gone, store failures
    pub async fn backfill(&self, id: EntityId) -> Result<String, QuillError> {
        let record = self.registry.require(id).await?;
        if let Some(token) = record.token() {
            return Ok(token.to_string());
        }

        let title = record.source_text().unwrap_or_default();
        let token = self.assign_on_rename(id, title).await?;
        self.registry.patch(id, R::token_patch(token.clone())).await?;
        tracing::info!("Backfilled {} {} with '{}'", R::KIND, id, token);
        Ok(token)
    }

    /// Assign tokens to every record lacking one, oldest first
    ///
    /// # Errors
    /// Store failures; records processed before the failure keep their tokens
    pub async fn backfill_all(&self) -> Result<BackfillReport, QuillError> {
        let mut report = BackfillReport::default();
        for record in self.registry.all().await? {
            report.scanned += 1;
            if record.token().is_some() {
                report.already_assigned += 1;
                continue;
            }
            let token = self.backfill(record.id()).await?;
            report.assigned.push((record.id(), token));
        }

        tracing::info!(
            "Backfill of {}s: {} scanned, {} assigned",
            R::KIND,
            report.scanned,
            report.assigned.len()
        );
        Ok(report)
    }

    /// Tokens stored on more than one record
    ///
    /// # Errors
    /// Store failures
    pub async fn find_duplicates(&self) -> Result<Vec<DuplicateToken>, QuillError> {
        let mut by_token: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        for record in self.registry.all().await? {
            if let Some(token) = record.token() {
                by_token.entry(token.to_string()).or_default().push(record.id());
            }
        }

        let duplicates: Vec<DuplicateToken> = by_token
            .into_iter()
            .filter(|(_, holders)| holders.len() > 1)
            .map(|(token, holders)| DuplicateToken { token, holders })
            .collect();

        for dup in &duplicates {
            tracing::warn!(
                "{} token '{}' held by {} records",
                R::KIND,
                dup.token,
                dup.holders.len()
            );
        }
        Ok(duplicates)
    }
}
