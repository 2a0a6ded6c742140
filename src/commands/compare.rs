use anyhow::{Context, Result};
use colored::Colorize;
use plan_pricing::compare::{self, ComparisonEntry, ComparisonQuery, ComparisonResult};
use plan_pricing::config::Config;
use plan_pricing::store;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub slug: String,
    pub storage: String,
    pub plan_id: Option<String>,
    /// Write `<slug>_<storage>_filtered.json` into the data directory
    pub save: bool,
    pub snapshot: Option<PathBuf>,
}

/// Execute the compare command
pub fn execute(cfg: &Config, options: CompareOptions) -> Result<()> {
    let path = super::snapshot_path(cfg, options.snapshot.clone());
    let snapshot = store::load(&path)
        .with_context(|| {
            format!(
                "Failed to load snapshot {} (run `plan-pricing collect` first?)",
                path.display()
            )
        })?;

    let mut query = ComparisonQuery::new(&options.slug, &options.storage);
    if let Some(plan_id) = &options.plan_id {
        query = query.with_plan(plan_id);
    }

    let result = compare::compare_query(&snapshot, &query)?;
    info!(
        slug = %result.device_slug,
        storage = %result.storage_label,
        entries = result.entries.len(),
        "Comparison complete"
    );

    print_result(&result);

    if options.save {
        let destination = cfg
            .output
            .data_dir
            .join(compare::filtered_artifact_name(&result.device_slug, &result.storage_label));
        store::write_json(&result, &destination)?;
        println!();
        println!("{} {}", "Saved".green(), destination.display());
    }

    Ok(())
}

fn print_result(result: &ComparisonResult) {
    println!(
        "{} {} {}",
        result.device_name.bold(),
        result.storage_label.bold(),
        format!("({})", result.device_slug).dimmed()
    );

    if result.is_empty() {
        println!("{}", "No offers found".yellow());
        return;
    }

    let cheapest = result.entries[0].monthly_price;
    for (idx, entry) in result.entries.iter().enumerate() {
        print_entry(idx + 1, entry, entry.monthly_price == cheapest);
    }
}

fn print_entry(rank: usize, entry: &ComparisonEntry, cheapest: bool) {
    let monthly = format!("${:.2}/mo", entry.monthly_price);
    let monthly = if cheapest { monthly.green().bold() } else { monthly.normal() };

    let plan = match &entry.plan_data {
        Some(data) => format!("{} ({})", entry.plan_name, data),
        None => entry.plan_name.clone(),
    };

    println!();
    println!("  {}. {} {}", rank, entry.group.name.cyan(), format!("[{}]", entry.group.id).dimmed());
    println!("     {}: {} {}", "Plan".cyan(), plan, format!("[{}]", entry.plan_id).dimmed());
    println!(
        "     {}: {} over {} months",
        "Financing".cyan(),
        monthly,
        entry.term_months
    );
    println!(
        "     {}: ${:.2}/mo, ${:.2} buyout",
        "Bring-it-back".cyan(),
        entry.bring_it_back_monthly,
        entry.upfront_price
    );
    println!(
        "     {}: ${:.2} financed, ${:.2} bring-it-back",
        "Total".cyan(),
        entry.total_financed,
        entry.total_bring_it_back
    );

    if !entry.add_ons.is_empty() {
        let names: Vec<String> = entry
            .add_ons
            .iter()
            .map(|a| {
                if a.is_free {
                    format!("{} (free)", a.name)
                } else {
                    format!("{} (${:.2})", a.name, a.price)
                }
            })
            .collect();
        println!("     {}: {}", "Add-ons".cyan(), names.join(", "));
    }
}
