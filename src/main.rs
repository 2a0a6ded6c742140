use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use plan_pricing::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    // Configuration decides the log level and format, so it loads first
    let cfg = config::load_config(&args.config)?;
    init_tracing(&cfg.logging.level, &cfg.logging.format);

    // Dispatch to appropriate command handler
    match args.get_command() {
        cli::Commands::Collect { output } => {
            commands::collect::execute(&cfg, output).await?;
        }
        cli::Commands::Compare {
            slug,
            storage,
            plan_id,
            no_save,
            snapshot,
        } => {
            let options = commands::compare::CompareOptions {
                slug,
                storage,
                plan_id,
                save: !no_save,
                snapshot,
            };
            commands::compare::execute(&cfg, options)?;
        }
        cli::Commands::Devices { snapshot } => {
            commands::list::devices(&cfg, snapshot)?;
        }
        cli::Commands::Plans { snapshot } => {
            commands::list::plans(&cfg, snapshot)?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&cfg)?,
            cli::ConfigCommands::Validate => commands::config::validate(&cfg)?,
        },
        cli::Commands::Version => {
            println!("Plan Pricing v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
