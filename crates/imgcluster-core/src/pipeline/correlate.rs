//! Maps the service's identifier-based clusters back onto staged entries.

use std::collections::HashMap;

use serde::Serialize;

use super::batch::{Batch, BatchEntry};
use crate::service::ClusterResult;

/// A cluster with its identifiers resolved to staged previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resolved entry names, parallel to `previews`
    pub members: Vec<String>,
    pub previews: Vec<String>,
}

impl ClusterView {
    pub fn len(&self) -> usize {
        self.previews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }
}

/// Resolves every cluster against `batch`, preserving result and identifier
/// order. Identifiers with no staged entry are dropped.
pub fn correlate(results: &[ClusterResult], batch: &Batch) -> Vec<ClusterView> {
    let index: HashMap<&str, &BatchEntry> = batch.iter().map(|entry| (entry.name(), entry)).collect();

    let mut dropped = 0usize;
    let views = results
        .iter()
        .map(|result| {
            let mut members = Vec::with_capacity(result.image_ids.len());
            let mut previews = Vec::with_capacity(result.image_ids.len());

            for id in &result.image_ids {
                if let Some(entry) = index.get(id.as_str()) {
                    members.push(id.clone());
                    previews.push(entry.preview.clone());
                } else {
                    tracing::trace!(cluster = %result.name, id = %id, "unknown image id");
                    dropped += 1;
                }
            }

            ClusterView {
                name: result.name.clone(),
                description: result.description.clone(),
                members,
                previews,
            }
        })
        .collect();

    if dropped > 0 {
        tracing::debug!(dropped, "dropped unresolved image ids");
    }
    views
}
