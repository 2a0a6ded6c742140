use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plan-pricing", version, about = "Phone plan pricing collector")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Collect a fresh pricing snapshot (default)
    Collect {
        /// Snapshot destination (overrides output.snapshot_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare offers for one device and storage size across all groups
    Compare {
        /// Device slug, e.g. apple-iphone-15
        #[arg(short, long)]
        slug: String,

        /// Storage label, e.g. 128GB (a bare number is accepted)
        #[arg(short = 't', long)]
        storage: String,

        /// Only show this plan
        #[arg(short, long)]
        plan_id: Option<String>,

        /// Do not write the filtered result file
        #[arg(long)]
        no_save: bool,

        /// Snapshot to read (overrides output.snapshot_path)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// List devices and storage options in the snapshot
    Devices {
        /// Snapshot to read (overrides output.snapshot_path)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// List plans seen in the snapshot
    Plans {
        /// Snapshot to read (overrides output.snapshot_path)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the effective configuration
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Collect if none provided
    pub fn get_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Collect { output: None })
    }
}
