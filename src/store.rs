//! Snapshot persistence
//!
//! Writes go to a hidden sibling temp file and are renamed into place, so an
//! interrupted run never leaves a partial artifact at the destination.
//! Key order is deterministic (struct field order, `BTreeMap` for devices),
//! which keeps consecutive snapshots diffable.

use crate::error::StoreError;
use crate::models::Snapshot;
use serde::Serialize;
use serde_json::error::Category;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn save(snapshot: &Snapshot, destination: &Path) -> Result<(), StoreError> {
    write_json(snapshot, destination)?;
    info!(
        path = %destination.display(),
        groups = snapshot.groups.len(),
        devices = snapshot.devices.len(),
        pricing_rows = snapshot.pricing.len(),
        add_ons = snapshot.add_ons.len(),
        "Snapshot saved"
    );
    Ok(())
}

pub fn load(source: &Path) -> Result<Snapshot, StoreError> {
    let content = fs::read_to_string(source).map_err(|e| StoreError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;

    let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
        let message = e.to_string();
        match e.classify() {
            Category::Data => StoreError::Schema {
                path: source.to_path_buf(),
                message,
            },
            Category::Io | Category::Syntax | Category::Eof => StoreError::Parse {
                path: source.to_path_buf(),
                message,
            },
        }
    })?;

    debug!(path = %source.display(), pricing_rows = snapshot.pricing.len(), "Snapshot loaded");
    Ok(snapshot)
}

/// Atomically write any serializable value as pretty JSON
pub fn write_json<T: Serialize + ?Sized>(value: &T, destination: &Path) -> Result<(), StoreError> {
    let write_err = |source: io::Error| StoreError::Write {
        path: destination.to_path_buf(),
        source,
    };

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| write_err(io::Error::other(e)))?;
    bytes.push(b'\n');

    let tmp = temp_path(destination);
    if let Err(e) = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, destination)) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }

    Ok(())
}

fn temp_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    destination.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}
