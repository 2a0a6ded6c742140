use anyhow::{Context, Result};
use colored::Colorize;
use plan_pricing::compare;
use plan_pricing::config::Config;
use plan_pricing::models::Snapshot;
use plan_pricing::store;
use std::path::PathBuf;

fn load(cfg: &Config, snapshot: Option<PathBuf>) -> Result<Snapshot> {
    let path = super::snapshot_path(cfg, snapshot);
    store::load(&path).with_context(|| format!("Failed to load snapshot {}", path.display()))
}

/// Execute the devices command
pub fn devices(cfg: &Config, snapshot: Option<PathBuf>) -> Result<()> {
    let snapshot = load(cfg, snapshot)?;
    let listings = compare::available_devices(&snapshot);

    println!(
        "{} {}",
        "Devices:".green().bold(),
        format!("(collected {})", snapshot.collected_at.format("%Y-%m-%d %H:%M UTC")).dimmed()
    );
    for listing in &listings {
        let storage = if listing.storage_labels.is_empty() {
            "-".dimmed().to_string()
        } else {
            listing.storage_labels.join(", ")
        };
        println!("  {} {} {}", listing.slug.cyan(), listing.display_name, format!("[{}]", storage).dimmed());
    }
    println!();
    println!("  Total: {}", listings.len());

    Ok(())
}

/// Execute the plans command
pub fn plans(cfg: &Config, snapshot: Option<PathBuf>) -> Result<()> {
    let snapshot = load(cfg, snapshot)?;
    let plans = compare::available_plans(&snapshot);

    println!("{}", "Plans:".green().bold());
    for (plan_id, labels) in &plans {
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        println!("  {} {}", plan_id.cyan(), labels.join(" | "));
    }
    println!();
    println!("  Total: {}", plans.len());

    Ok(())
}
