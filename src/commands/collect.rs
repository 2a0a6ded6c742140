use anyhow::{Context, Result};
use colored::Colorize;
use plan_pricing::catalog::{CatalogSource, HttpCatalogClient};
use plan_pricing::config::Config;
use plan_pricing::metrics;
use plan_pricing::pipeline::{self, summary::CompletenessSummary};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Execute the collect command
///
/// Runs a full aggregation against the configured catalog and atomically
/// replaces the snapshot. A failed run leaves the previous snapshot in place.
pub async fn execute(cfg: &Config, output: Option<PathBuf>) -> Result<()> {
    let destination = super::snapshot_path(cfg, output);
    let client = HttpCatalogClient::new(&cfg.catalog, cfg.pipeline.default_term_months)
        .context("Failed to build catalog client")?;

    println!(
        "{} {}",
        "Collecting pricing from".yellow(),
        client.base_url().cyan()
    );
    info!(base_url = %client.base_url(), destination = %destination.display(), "Starting collection");

    let metrics_handle = cfg
        .output
        .metrics_path
        .as_ref()
        .and_then(|_| metrics::init_metrics());

    let source: Arc<dyn CatalogSource> = Arc::new(client);
    let result = pipeline::run_and_save(source, cfg, &destination).await;

    if let (Some(handle), Some(path)) = (&metrics_handle, &cfg.output.metrics_path) {
        metrics::write_exposition(handle, path)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    let report = result.context("Collection failed, previous snapshot left untouched")?;

    println!("{}", "✓ Snapshot saved".green());
    println!("  {}: {}", "Path".cyan(), destination.display());
    println!("  {}: {}", "Groups".cyan(), report.snapshot.groups.len());
    println!("  {}: {}", "Devices".cyan(), report.snapshot.devices.len());
    println!("  {}: {}", "Pricing rows".cyan(), report.snapshot.pricing.len());
    println!("  {}: {}", "Add-ons".cyan(), report.snapshot.add_ons.len());
    println!();
    print_summary(&report.summary);

    Ok(())
}

fn print_summary(summary: &CompletenessSummary) {
    println!("{}", "Completeness:".bold());
    let families = [
        ("Group searches", summary.group_searches),
        ("Group details", summary.group_details),
        ("Pricing", summary.pricing),
        ("Add-ons", summary.add_ons),
    ];
    for (label, tally) in families {
        let counts = tally.to_string();
        let counts = if tally.failed() == 0 {
            counts.green()
        } else {
            counts.red()
        };
        println!("  {}: {}", label.cyan(), counts);
    }

    if summary.is_complete() {
        return;
    }

    println!();
    println!("{}", format!("Skipped ({}):", summary.skipped.len()).yellow());
    for skipped in &summary.skipped {
        println!(
            "  {} {} {}",
            skipped.item,
            "→".dimmed(),
            skipped.reason.dimmed()
        );
    }
}
