//! `imgcluster cluster`: stage images, submit them, show the clusters.

use anyhow::{Context, Result, bail};
use comfy_table::{ContentArrangement, Table};
use imgcluster_core::config::Config;
use imgcluster_core::pipeline::{ClusterView, IntakeController, IntakeReport};
use imgcluster_core::service::HttpClusteringClient;
use imgcluster_core::session::Session;
use serde::Serialize;

use super::{print_report_notices, select};

#[derive(Serialize)]
struct ClusterOutput<'a> {
    intake: &'a IntakeReport,
    clusters: &'a [ClusterView],
}

pub async fn run(paths: &[String], json: bool, config: &Config) -> Result<()> {
    let service = HttpClusteringClient::from_config(&config.service)?
        .with_endpoint(config.service.endpoint.clone());
    tracing::debug!(endpoint = service.endpoint(), "using clustering service");
    let mut session = Session::new(IntakeController::new(config.intake.clone()), service);

    let report = session.add_files(select(paths)?).await;
    print_report_notices(&report, &config.intake);
    if session.batch().is_empty() {
        bail!("No images to cluster");
    }

    let clusters = session
        .submit()
        .await
        .with_context(|| format!("Clustering request to {} failed", config.service.endpoint))?;

    if json {
        let output = ClusterOutput {
            intake: &report,
            clusters,
        };
        let rendered = serde_json::to_string_pretty(&output).context("serialize clusters")?;
        println!("{rendered}");
        return Ok(());
    }

    if clusters.is_empty() {
        println!("The service returned no clusters");
        return Ok(());
    }
    println!("{}", cluster_table(clusters));
    Ok(())
}

fn cluster_table(clusters: &[ClusterView]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Cluster", "Images", "Members", "Description"]);

    for view in clusters {
        table.add_row(vec![
            view.name.clone(),
            view.len().to_string(),
            view.members.join(", "),
            view.description.clone().unwrap_or_default(),
        ]);
    }
    table
}
