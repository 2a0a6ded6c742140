use crate::error::IntegrityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A population entitled to negotiated pricing (a remote "company group")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityGroup {
    pub id: String,
    pub name: String,
    /// First configured search term whose results led to this group
    pub search_key: String,
    /// Member company names, sorted and de-duplicated
    pub companies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageVariant {
    /// Normalized capacity label, e.g. "128GB"
    pub capacity_label: String,
    /// Remote model id used by pricing and add-on lookups
    pub model_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub slug: String,
    pub display_name: String,
    pub variants: Vec<StorageVariant>,
}

impl Device {
    /// Find a storage variant by label. `128`, `128gb` and `128GB` all match.
    pub fn variant(&self, label: &str) -> Option<&StorageVariant> {
        let wanted = normalize_storage_label(label);
        self.variants.iter().find(|v| v.capacity_label == wanted)
    }

    pub fn storage_labels(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.capacity_label.clone()).collect()
    }

    /// Insert or replace variants by model id, keeping the list ordered by
    /// capacity.
    pub fn merge_variants(&mut self, variants: impl IntoIterator<Item = StorageVariant>) {
        for variant in variants {
            match self.variants.iter_mut().find(|v| v.model_id == variant.model_id) {
                Some(existing) => *existing = variant,
                None => self.variants.push(variant),
            }
        }
        self.variants.sort_by(|a, b| {
            capacity_gb(&a.capacity_label)
                .cmp(&capacity_gb(&b.capacity_label))
                .then_with(|| a.model_id.cmp(&b.model_id))
        });
    }
}

/// Normalize a storage label to the `"<n>GB"` form used in snapshots
pub fn normalize_storage_label(label: &str) -> String {
    let trimmed: String = label.chars().filter(|c| !c.is_whitespace()).collect();
    let upper = trimmed.to_ascii_uppercase();
    if !upper.is_empty() && upper.chars().all(|c| c.is_ascii_digit()) {
        format!("{upper}GB")
    } else {
        upper
    }
}

/// Like the derived `Option` handling, but the key itself must be present
fn required_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::deserialize(deserializer)
}

/// Round a currency amount to cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn capacity_gb(label: &str) -> u64 {
    label
        .trim_end_matches("GB")
        .parse()
        .unwrap_or(u64::MAX)
}

/// One (device, variant, group, plan) price quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    pub device_id: String,
    pub model_id: String,
    pub group_id: String,
    pub plan_id: String,
    pub plan_name: String,
    #[serde(deserialize_with = "required_option")]
    pub plan_data: Option<String>,
    /// Plan-only monthly charge
    pub plan_price: f64,
    /// Monthly charge including device financing
    pub monthly_price: f64,
    /// Monthly charge under the bring-it-back option
    pub bring_it_back_monthly: f64,
    /// Bring-it-back buyout amount
    pub upfront_price: f64,
    pub financed_total: f64,
    pub term_months: u32,
}

/// Uniqueness key of a pricing row: (device, model, group, plan)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PricingKey {
    pub device_id: String,
    pub model_id: String,
    pub group_id: String,
    pub plan_id: String,
}

impl PricingRow {
    pub fn key(&self) -> PricingKey {
        PricingKey {
            device_id: self.device_id.clone(),
            model_id: self.model_id.clone(),
            group_id: self.group_id.clone(),
            plan_id: self.plan_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub is_free: bool,
    pub plan_id: String,
    pub group_id: String,
    pub device_id: String,
}

impl AddOn {
    /// (device, group, plan, add-on) ordering/uniqueness key
    pub fn key(&self) -> (String, String, String, String) {
        (
            self.device_id.clone(),
            self.group_id.clone(),
            self.plan_id.clone(),
            self.id.clone(),
        )
    }

    pub fn applies_to(&self, device_id: &str, group_id: &str, plan_id: &str) -> bool {
        self.device_id == device_id && self.group_id == group_id && self.plan_id == plan_id
    }
}

/// The normalized dataset produced by one aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub collected_at: DateTime<Utc>,
    pub groups: Vec<EligibilityGroup>,
    pub devices: BTreeMap<String, Device>,
    pub pricing: Vec<PricingRow>,
    pub add_ons: Vec<AddOn>,
}

impl Snapshot {
    pub fn group(&self, id: &str) -> Option<&EligibilityGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn device_by_slug(&self, slug: &str) -> Option<&Device> {
        self.devices.values().find(|d| d.slug == slug)
    }

    /// Every pricing row and add-on must reference a known device and group
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        let group_ids: HashSet<&str> = self.groups.iter().map(|g| g.id.as_str()).collect();

        let references = self
            .pricing
            .iter()
            .map(|r| (format!("pricing row {}/{}", r.model_id, r.plan_id), &r.device_id, &r.group_id))
            .chain(
                self.add_ons
                    .iter()
                    .map(|a| (format!("add-on {}/{}", a.id, a.plan_id), &a.device_id, &a.group_id)),
            );

        for (record, device_id, group_id) in references {
            if !self.devices.contains_key(device_id) {
                return Err(IntegrityError::UnknownDevice {
                    record,
                    device_id: device_id.clone(),
                });
            }
            if !group_ids.contains(group_id.as_str()) {
                return Err(IntegrityError::UnknownGroup {
                    record,
                    group_id: group_id.clone(),
                });
            }
        }

        Ok(())
    }
}
