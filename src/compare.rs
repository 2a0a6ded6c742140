//! Comparison engine
//!
//! Pure, synchronous joins over an immutable `Snapshot`. Results are views:
//! they can be rebuilt from the snapshot at any time.

use crate::error::{CompareError, IntegrityError};
use crate::models::snapshot::round_cents;
use crate::models::{normalize_storage_label, AddOn, Device, EligibilityGroup, Snapshot};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonQuery {
    pub device_slug: String,
    pub storage_label: String,
    /// Only report this plan
    pub plan_id: Option<String>,
}

impl ComparisonQuery {
    pub fn new(device_slug: impl Into<String>, storage_label: impl Into<String>) -> Self {
        Self {
            device_slug: device_slug.into(),
            storage_label: storage_label.into(),
            plan_id: None,
        }
    }

    pub fn with_plan(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }
}

/// Group reference carried by a comparison entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

impl From<&EligibilityGroup> for GroupRef {
    fn from(group: &EligibilityGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub group: GroupRef,
    pub plan_id: String,
    pub plan_name: String,
    pub plan_data: Option<String>,
    pub plan_price: f64,
    /// Financing option: monthly charge
    pub monthly_price: f64,
    /// Bring-it-back option: monthly charge plus the buyout below
    pub bring_it_back_monthly: f64,
    pub upfront_price: f64,
    pub term_months: u32,
    /// monthly × term
    pub total_financed: f64,
    /// buyout + bring-it-back monthly × term
    pub total_bring_it_back: f64,
    pub add_ons: Vec<AddOn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub device_slug: String,
    pub device_name: String,
    pub storage_label: String,
    pub entries: Vec<ComparisonEntry>,
}

impl ComparisonResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn compare(
    snapshot: &Snapshot,
    device_slug: &str,
    storage_label: &str,
) -> Result<ComparisonResult, CompareError> {
    compare_query(snapshot, &ComparisonQuery::new(device_slug, storage_label))
}

/// Join the snapshot's pricing rows for one device/storage pair across every
/// group and plan, ranked by monthly price ascending, then group id, then plan
/// id. An empty entry list means no offers were found.
pub fn compare_query(snapshot: &Snapshot, query: &ComparisonQuery) -> Result<ComparisonResult, CompareError> {
    let device = resolve_device(snapshot, &query.device_slug)?;
    let variant = device
        .variant(&query.storage_label)
        .ok_or_else(|| CompareError::VariantNotFound {
            slug: device.slug.clone(),
            storage: normalize_storage_label(&query.storage_label),
            available: device.storage_labels(),
        })?;

    let groups: BTreeMap<&str, &EligibilityGroup> =
        snapshot.groups.iter().map(|g| (g.id.as_str(), g)).collect();

    let mut entries = Vec::new();
    for row in snapshot
        .pricing
        .iter()
        .filter(|r| r.device_id == device.id && r.model_id == variant.model_id)
        .filter(|r| query.plan_id.as_deref().map_or(true, |p| r.plan_id == p))
    {
        let group = groups
            .get(row.group_id.as_str())
            .ok_or_else(|| IntegrityError::UnknownGroup {
                record: format!("pricing row {}/{}", row.model_id, row.plan_id),
                group_id: row.group_id.clone(),
            })?;

        let term = f64::from(row.term_months);
        let mut add_ons: Vec<AddOn> = snapshot
            .add_ons
            .iter()
            .filter(|a| a.applies_to(&row.device_id, &row.group_id, &row.plan_id))
            .cloned()
            .collect();
        add_ons.sort_by(|a, b| a.id.cmp(&b.id));

        entries.push(ComparisonEntry {
            group: GroupRef::from(*group),
            plan_id: row.plan_id.clone(),
            plan_name: row.plan_name.clone(),
            plan_data: row.plan_data.clone(),
            plan_price: row.plan_price,
            monthly_price: row.monthly_price,
            bring_it_back_monthly: row.bring_it_back_monthly,
            upfront_price: row.upfront_price,
            term_months: row.term_months,
            total_financed: round_cents(row.monthly_price * term),
            total_bring_it_back: round_cents(row.upfront_price + row.bring_it_back_monthly * term),
            add_ons,
        });
    }

    entries.sort_by(rank);

    Ok(ComparisonResult {
        device_slug: device.slug.clone(),
        device_name: device.display_name.clone(),
        storage_label: variant.capacity_label.clone(),
        entries,
    })
}

fn rank(a: &ComparisonEntry, b: &ComparisonEntry) -> Ordering {
    a.monthly_price
        .total_cmp(&b.monthly_price)
        .then_with(|| a.group.id.cmp(&b.group.id))
        .then_with(|| a.plan_id.cmp(&b.plan_id))
}

fn resolve_device<'a>(snapshot: &'a Snapshot, slug: &str) -> Result<&'a Device, CompareError> {
    snapshot.device_by_slug(slug).ok_or_else(|| {
        let needle = slug.to_lowercase();
        let suggestions = snapshot
            .devices
            .values()
            .filter(|d| !needle.is_empty() && d.slug.to_lowercase().contains(&needle))
            .map(|d| d.slug.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        CompareError::DeviceNotFound {
            slug: slug.to_string(),
            suggestions,
        }
    })
}

/// A queryable device and its storage options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceListing {
    pub slug: String,
    pub display_name: String,
    pub storage_labels: Vec<String>,
}

/// Every device in the snapshot, sorted by slug
pub fn available_devices(snapshot: &Snapshot) -> Vec<DeviceListing> {
    let mut listings: Vec<DeviceListing> = snapshot
        .devices
        .values()
        .map(|d| DeviceListing {
            slug: d.slug.clone(),
            display_name: d.display_name.clone(),
            storage_labels: d.storage_labels(),
        })
        .collect();
    listings.sort_by(|a, b| a.slug.cmp(&b.slug));
    listings
}

/// Plan id → distinct "title (data)" labels seen across the snapshot
pub fn available_plans(snapshot: &Snapshot) -> BTreeMap<String, BTreeSet<String>> {
    let mut plans: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in &snapshot.pricing {
        let label = match &row.plan_data {
            Some(data) => format!("{} ({})", row.plan_name, data),
            None => row.plan_name.clone(),
        };
        plans.entry(row.plan_id.clone()).or_default().insert(label);
    }
    plans
}

/// File name of the filtered-result artifact for a query
pub fn filtered_artifact_name(device_slug: &str, storage_label: &str) -> String {
    format!(
        "{}_{}_filtered.json",
        device_slug,
        normalize_storage_label(storage_label).to_lowercase()
    )
}
