//! Single-owner snapshot accumulator
//!
//! Workers never touch the in-progress snapshot. They submit `WorkOutcome`s
//! over an unbounded channel; one background task owns the `SnapshotBuilder`
//! and applies merges in arrival order. Dropping every handle closes the
//! channel and the task hands the builder back through its `JoinHandle`.

use crate::error::IntegrityError;
use crate::models::{AddOn, Device, EligibilityGroup, PricingKey, PricingRow, Snapshot};
use crate::pipeline::summary::CompletenessSummary;
use crate::pipeline::work::{Fetched, WorkItem, WorkOutcome};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type AddOnKey = (String, String, String, String);

/// In-progress snapshot plus the completeness tallies
#[derive(Debug)]
pub struct SnapshotBuilder {
    groups: BTreeMap<String, EligibilityGroup>,
    devices: BTreeMap<String, Device>,
    pricing: BTreeMap<PricingKey, PricingRow>,
    add_ons: BTreeMap<AddOnKey, AddOn>,
    summary: CompletenessSummary,
}

impl SnapshotBuilder {
    /// Start from the enumerated groups and devices. Duplicate ids collapse,
    /// the later entry winning.
    pub fn new(
        groups: impl IntoIterator<Item = EligibilityGroup>,
        devices: impl IntoIterator<Item = Device>,
        summary: CompletenessSummary,
    ) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
            devices: devices.into_iter().map(|d| (d.id.clone(), d)).collect(),
            pricing: BTreeMap::new(),
            add_ons: BTreeMap::new(),
            summary,
        }
    }

    pub fn merge(&mut self, outcome: WorkOutcome) {
        match outcome {
            WorkOutcome::Skipped { item, reason } => {
                self.summary.record_skip(item.family(), item.to_string(), reason);
            }
            WorkOutcome::Fetched { item, data } => {
                self.summary.record_success(item.family());
                match data {
                    Fetched::Pricing(pricing) => {
                        if let WorkItem::Pricing { device_id, .. } = &item {
                            if let Some(device) = self.devices.get_mut(device_id) {
                                device.merge_variants(pricing.variants);
                            }
                        }
                        self.merge_pricing_rows(pricing.rows);
                    }
                    Fetched::AddOns(add_ons) => self.merge_add_ons(add_ons),
                }
            }
        }
    }

    /// Insert rows keyed by (device, model, group, plan). A row whose key was
    /// already merged replaces the earlier one.
    pub fn merge_pricing_rows(&mut self, rows: impl IntoIterator<Item = PricingRow>) {
        for row in rows {
            if let Some(previous) = self.pricing.insert(row.key(), row) {
                tracing::debug!(
                    device_id = %previous.device_id,
                    model_id = %previous.model_id,
                    group_id = %previous.group_id,
                    plan_id = %previous.plan_id,
                    "Duplicate pricing row replaced by later fetch"
                );
            }
        }
    }

    pub fn merge_add_ons(&mut self, add_ons: impl IntoIterator<Item = AddOn>) {
        for add_on in add_ons {
            self.add_ons.insert(add_on.key(), add_on);
        }
    }

    pub fn summary(&self) -> &CompletenessSummary {
        &self.summary
    }

    /// Produce the snapshot, refusing one that breaks referential integrity
    pub fn finish(
        self,
        collected_at: DateTime<Utc>,
    ) -> Result<(Snapshot, CompletenessSummary), IntegrityError> {
        let snapshot = Snapshot {
            collected_at,
            groups: self.groups.into_values().collect(),
            devices: self.devices,
            pricing: self.pricing.into_values().collect(),
            add_ons: self.add_ons.into_values().collect(),
        };
        snapshot.check_integrity()?;
        Ok((snapshot, self.summary))
    }
}

/// Cloneable submission handle held by workers
#[derive(Clone)]
pub struct AccumulatorHandle {
    sender: mpsc::UnboundedSender<WorkOutcome>,
}

impl AccumulatorHandle {
    /// Submit an outcome (non-blocking)
    pub fn submit(&self, outcome: WorkOutcome) {
        if let Err(e) = self.sender.send(outcome) {
            tracing::error!(item = %e.0.item(), "Accumulator is gone, outcome dropped");
        }
    }
}

/// Spawn the accumulator task that owns `builder`
pub fn spawn(builder: SnapshotBuilder) -> (AccumulatorHandle, JoinHandle<SnapshotBuilder>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(accumulator_task(builder, rx));
    (AccumulatorHandle { sender: tx }, task)
}

async fn accumulator_task(
    mut builder: SnapshotBuilder,
    mut rx: mpsc::UnboundedReceiver<WorkOutcome>,
) -> SnapshotBuilder {
    let mut merged = 0usize;
    while let Some(outcome) = rx.recv().await {
        builder.merge(outcome);
        merged += 1;
    }

    tracing::debug!(outcomes = merged, "Accumulator channel closed");
    builder
}
