use anyhow::Result;
use colored::Colorize;
use plan_pricing::config::{self, Config};
use plan_pricing::pipeline;
use tracing::info;

/// Execute the config show command
///
/// Displays the effective configuration (file plus environment overrides)
pub fn show(cfg: &Config) -> Result<()> {
    info!("Displaying effective configuration");

    println!("{}", "Current Configuration:".green().bold());
    println!();

    // Serialize to TOML format
    let toml_string = toml::to_string_pretty(cfg)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
pub fn validate(cfg: &Config) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    config::validate_config(cfg)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  {}: {}", "Catalog".cyan(), cfg.catalog.base_url);
    println!(
        "  {}: {} / {} / {}",
        "Context".cyan(),
        cfg.catalog.province,
        cfg.catalog.customer_type,
        cfg.catalog.customer_line
    );
    println!("  {}: {}", "Search Terms".cyan(), describe_search_terms(cfg));
    println!("  {}: {}", "Concurrency".cyan(), cfg.pipeline.concurrency);
    println!(
        "  {}: {} x {}ms backoff",
        "Retries".cyan(),
        cfg.pipeline.retry_attempts,
        cfg.pipeline.retry_backoff_ms
    );
    println!("  {}: {}", "Snapshot".cyan(), cfg.output.snapshot_path.display());

    info!("Configuration validation successful");
    Ok(())
}

fn describe_search_terms(cfg: &Config) -> String {
    if cfg.pipeline.search_terms.is_empty() {
        format!("generated ({})", pipeline::search_terms(&[]).len())
    } else {
        format!("{} configured", cfg.pipeline.search_terms.len())
    }
}
