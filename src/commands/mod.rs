//! Command implementations for the CLI
//!
//! - collect: Run the aggregation pipeline and save a snapshot
//! - compare: Rank offers for one device/storage pair
//! - list: Devices and plans available in a snapshot
//! - config: Configuration display and validation

pub mod collect;
pub mod compare;
pub mod config;
pub mod list;

use plan_pricing::config::Config;
use std::path::PathBuf;

/// Snapshot path from the command line, falling back to the configured one
pub(crate) fn snapshot_path(cfg: &Config, overridden: Option<PathBuf>) -> PathBuf {
    overridden.unwrap_or_else(|| cfg.output.snapshot_path.clone())
}
