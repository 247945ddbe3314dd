//! Batch intake controller.
//!
//! Candidates are processed strictly one after another: each image's
//! normalize + preview work finishes (on the blocking pool) before the next
//! candidate starts, so entries land in selection order regardless of how long
//! each decode takes.

use std::sync::Arc;

use serde::Serialize;

use super::batch::{Batch, BatchEntry, Truncation};
use super::normalize::normalize;
use super::preview::{DataUriEncoder, PreviewEncoder};
use crate::config::{DuplicatePolicy, IntakePolicy};
use crate::error::DecodeError;
use crate::images::RawImage;
use crate::images::codec::{ImageCodec, RasterCodec};

/// What one intake pass did with its candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeReport {
    /// Newly appended entry names, in order
    pub added: Vec<String>,
    /// Names whose staged entry was swapped in place
    pub replaced: Vec<String>,
    /// Candidates without an `image/*` MIME type
    pub skipped_non_image: Vec<String>,
    /// Candidates that failed to decode
    pub skipped_undecodable: Vec<String>,
    /// Candidates rejected because the name was already staged
    pub skipped_duplicate: Vec<String>,
    /// Candidates never looked at because the batch filled up
    pub not_processed: usize,
    pub truncation: Truncation,
}

impl IntakeReport {
    /// Legacy combined flag (capacity hit or nothing added).
    pub fn truncated(&self) -> bool {
        self.truncation.any()
    }
}

/// Applies an [`IntakePolicy`] to candidate sets and grows a [`Batch`].
#[derive(Debug)]
pub struct IntakeController<C = RasterCodec, P = DataUriEncoder> {
    policy: IntakePolicy,
    codec: Arc<C>,
    previews: Arc<P>,
}

impl IntakeController {
    /// Controller with the `image`-backed codec and data URI previews.
    pub fn new(policy: IntakePolicy) -> Self {
        Self::with_collaborators(policy, RasterCodec, DataUriEncoder)
    }
}

impl<C: ImageCodec, P: PreviewEncoder> IntakeController<C, P> {
    pub fn with_collaborators(policy: IntakePolicy, codec: C, previews: P) -> Self {
        Self {
            policy,
            codec: Arc::new(codec),
            previews: Arc::new(previews),
        }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Normalizes one image and renders its preview on the blocking pool.
    ///
    /// # Errors
    /// Returns [`DecodeError`] when the image cannot be decoded (a panicking
    /// decoder is reported the same way).
    pub async fn prepare(&self, image: RawImage) -> Result<BatchEntry, DecodeError> {
        let codec = Arc::clone(&self.codec);
        let previews = Arc::clone(&self.previews);
        let policy = self.policy.clone();
        let name = image.name().to_string();

        tokio::task::spawn_blocking(move || {
            let normalized = normalize(codec.as_ref(), &policy, image)?;
            let preview = previews.encode(&normalized.image);
            Ok(BatchEntry {
                image: normalized,
                preview,
            })
        })
        .await
        .unwrap_or_else(|join_err| Err(DecodeError::new(name, format!("decoder task failed: {join_err}"))))
    }

    /// Runs one intake pass over `candidates`, extending `batch` in place.
    ///
    /// Existing entries are never reordered. The batch's truncation signals
    /// are overwritten with this pass's outcome.
    pub async fn intake(&self, candidates: Vec<RawImage>, batch: &mut Batch) -> IntakeReport {
        let total = candidates.len();
        let mut report = IntakeReport::default();

        for (index, candidate) in candidates.into_iter().enumerate() {
            if !candidate.is_image() {
                tracing::debug!(
                    name = candidate.name(),
                    mime = candidate.mime_type(),
                    "skipping non-image"
                );
                report.skipped_non_image.push(candidate.name().to_string());
                continue;
            }

            if batch.len() >= self.policy.max_files {
                report.truncation.by_capacity = true;
                report.not_processed = total - index;
                tracing::debug!(
                    name = candidate.name(),
                    max_files = self.policy.max_files,
                    "batch full, stopping"
                );
                break;
            }

            let duplicate = batch.contains(candidate.name());
            if duplicate && self.policy.duplicate_names == DuplicatePolicy::Reject {
                tracing::debug!(name = candidate.name(), "duplicate name rejected");
                report.skipped_duplicate.push(candidate.name().to_string());
                continue;
            }

            let name = candidate.name().to_string();
            match self.prepare(candidate).await {
                Ok(entry) if duplicate => {
                    batch.replace(entry);
                    report.replaced.push(name);
                }
                Ok(entry) => {
                    batch.push(entry);
                    report.added.push(name);
                }
                Err(err) => {
                    tracing::debug!(error = %err, "skipping undecodable candidate");
                    report.skipped_undecodable.push(name);
                }
            }
        }

        if total > 0 && report.added.is_empty() && report.replaced.is_empty() {
            report.truncation.nothing_added = true;
        }
        batch.set_truncation(report.truncation);

        tracing::info!(
            candidates = total,
            added = report.added.len(),
            replaced = report.replaced.len(),
            non_image = report.skipped_non_image.len(),
            undecodable = report.skipped_undecodable.len(),
            duplicates = report.skipped_duplicate.len(),
            batch_len = batch.len(),
            truncated_by_capacity = report.truncation.by_capacity,
            nothing_added = report.truncation.nothing_added,
            "intake pass finished"
        );
        report
    }
}
