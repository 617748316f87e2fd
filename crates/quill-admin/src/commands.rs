//! Subcommand bodies, kept free of argument parsing

use anyhow::{Context, Result};
use quill_core::{AuditReport, BackfillSummary, Quill, QuillConfig, StaticAuth};
use quill_slug::{normalize_or, SlugKind};
use quill_store::{MemoryStore, Snapshot};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Canonical token for `text`, using the configured fallback
pub(crate) fn slugify(text: &str, kind: SlugKind, config: &QuillConfig) -> String {
    normalize_or(text, config.identifiers.fallback(kind))
}

fn open(path: &Path, config: QuillConfig) -> Result<(Quill, MemoryStore)> {
    let snapshot = Snapshot::load(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let store = MemoryStore::from_snapshot(snapshot);
    let quill = Quill::in_memory(&store, Arc::new(StaticAuth::anonymous()), config)?;
    Ok((quill, store))
}

/// Backfill every legacy record in a snapshot, optionally saving the result
pub(crate) async fn backfill(
    path: &Path,
    write: bool,
    config: QuillConfig,
) -> Result<BackfillSummary> {
    let (quill, store) = open(path, config)?;
    let summary = quill.backfill_all().await.context("backfill failed")?;

    if write && summary.assigned() > 0 {
        store
            .snapshot()
            .save(path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        tracing::info!("Wrote {} new tokens to {}", summary.assigned(), path.display());
    } else if !write {
        tracing::info!("Dry run, {} unchanged", path.display());
    }
    Ok(summary)
}

/// Duplicate tokens in a snapshot
pub(crate) async fn audit(path: &Path, config: QuillConfig) -> Result<AuditReport> {
    let (quill, _store) = open(path, config)?;
    Ok(quill.audit().await.context("audit failed")?)
}

pub(crate) fn render_backfill(summary: &BackfillSummary) -> String {
    let mut out = String::new();
    for (label, report) in [("posts", &summary.posts), ("users", &summary.users)] {
        let _ = writeln!(
            out,
            "{label}: {} scanned, {} already assigned, {} assigned",
            report.scanned,
            report.already_assigned,
            report.assigned.len()
        );
        for (id, token) in &report.assigned {
            let _ = writeln!(out, "  {id} -> {token}");
        }
    }
    out.trim_end().to_string()
}

pub(crate) fn render_audit(report: &AuditReport) -> String {
    if report.is_clean() {
        return "No duplicate tokens".to_string();
    }
    let mut out = String::new();
    for (label, duplicates) in [("post slug", &report.posts), ("username", &report.users)] {
        for dup in duplicates {
            let holders: Vec<String> = dup.holders.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "{label} '{}' held by {}", dup.token, holders.join(", "));
        }
    }
    out.trim_end().to_string()
}
