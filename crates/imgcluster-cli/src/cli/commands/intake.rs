//! `imgcluster intake`: one intake pass, no submission.

use anyhow::{Context, Result};
use imgcluster_core::config::Config;
use imgcluster_core::pipeline::{Batch, IntakeController, IntakeReport, Truncation};
use serde::Serialize;

use super::{EntrySummary, batch_table, entry_summaries, print_report_notices, select};

#[derive(Serialize)]
struct IntakeOutput<'a> {
    entries: Vec<EntrySummary<'a>>,
    total_bytes: u64,
    report: &'a IntakeReport,
    truncation: Truncation,
    truncated: bool,
}

pub async fn run(paths: &[String], json: bool, config: &Config) -> Result<()> {
    let candidates = select(paths)?;
    let controller = IntakeController::new(config.intake.clone());
    let mut batch = Batch::new();
    let report = controller.intake(candidates, &mut batch).await;

    if json {
        let output = IntakeOutput {
            entries: entry_summaries(&batch),
            total_bytes: batch.total_bytes(),
            report: &report,
            truncation: batch.truncation(),
            truncated: batch.truncated(),
        };
        let rendered = serde_json::to_string_pretty(&output).context("serialize intake report")?;
        println!("{rendered}");
    } else {
        if !batch.is_empty() {
            println!("{}", batch_table(&batch));
        }
        println!(
            "Staged {} of at most {} image(s)",
            batch.len(),
            config.intake.max_files
        );
    }

    print_report_notices(&report, &config.intake);
    Ok(())
}
