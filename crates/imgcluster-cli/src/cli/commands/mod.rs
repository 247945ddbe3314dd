//! CLI command handlers.

pub mod cluster;
pub mod config;
pub mod intake;
pub mod preview;

use anyhow::Result;
use comfy_table::{ContentArrangement, Table};
use imgcluster_core::config::IntakePolicy;
use imgcluster_core::images::RawImage;
use imgcluster_core::pipeline::{Batch, FileSource, IntakeReport, NormalizeOutcome, PathSource};
use serde::Serialize;

/// Reads user-typed paths into an ordered candidate list.
fn select(paths: &[String]) -> Result<Vec<RawImage>> {
    let mut source = PathSource::from_args(paths);
    source.select()
}

/// JSON view of one staged entry (previews left out).
#[derive(Serialize)]
struct EntrySummary<'a> {
    name: &'a str,
    mime_type: &'a str,
    width: u32,
    height: u32,
    bytes: u64,
    outcome: NormalizeOutcome,
}

fn entry_summaries(batch: &Batch) -> Vec<EntrySummary<'_>> {
    batch
        .iter()
        .map(|entry| EntrySummary {
            name: entry.name(),
            mime_type: entry.image.image.mime_type(),
            width: entry.image.width,
            height: entry.image.height,
            bytes: entry.image.image.len(),
            outcome: entry.image.outcome,
        })
        .collect()
}

fn outcome_label(outcome: NormalizeOutcome) -> String {
    match outcome {
        NormalizeOutcome::Unchanged => "unchanged".to_string(),
        NormalizeOutcome::Resized { from: (w, h) } => format!("resized from {w}x{h}"),
        NormalizeOutcome::EncodeFallback => "original (re-encode failed)".to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;

    match bytes {
        b if b >= MIB => format!("{:.1} MiB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.1} KiB", b as f64 / KIB as f64),
        b => format!("{b} B"),
    }
}

fn batch_table(batch: &Batch) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Name", "Type", "Size", "Bytes", "Normalized"]);

    for (index, entry) in batch.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            entry.name().to_string(),
            entry.image.image.mime_type().to_string(),
            format!("{}x{}", entry.image.width, entry.image.height),
            format_bytes(entry.image.image.len()),
            outcome_label(entry.image.outcome),
        ]);
    }
    table
}

/// Prints skip and truncation notices for one intake pass to stderr.
fn print_report_notices(report: &IntakeReport, policy: &IntakePolicy) {
    for name in &report.skipped_non_image {
        eprintln!("Skipped {name}: not an image");
    }
    for name in &report.skipped_undecodable {
        eprintln!("Skipped {name}: could not be decoded");
    }
    for name in &report.skipped_duplicate {
        eprintln!("Skipped {name}: already staged");
    }
    if report.truncation.by_capacity {
        eprintln!(
            "Batch is full ({} files max); {} file(s) were not added",
            policy.max_files, report.not_processed
        );
    }
    if report.truncation.nothing_added {
        eprintln!("No images were added");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.5 MiB");
    }

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label(NormalizeOutcome::Unchanged), "unchanged");
        assert_eq!(
            outcome_label(NormalizeOutcome::Resized { from: (1200, 800) }),
            "resized from 1200x800"
        );
    }
}
