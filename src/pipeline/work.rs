use crate::catalog::DevicePricing;
use crate::models::AddOn;
use crate::pipeline::summary::FetchFamily;
use std::fmt;

/// One unit of fan-out work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// Pricing for every storage variant of a device under one group
    Pricing {
        device_id: String,
        slug: String,
        group_id: String,
    },
    /// Add-ons for one fetched pricing row
    AddOns {
        device_id: String,
        model_id: String,
        group_id: String,
        plan_id: String,
    },
}

impl WorkItem {
    pub fn family(&self) -> FetchFamily {
        match self {
            Self::Pricing { .. } => FetchFamily::Pricing,
            Self::AddOns { .. } => FetchFamily::AddOns,
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pricing { slug, group_id, .. } => write!(f, "pricing {} @ group {}", slug, group_id),
            Self::AddOns {
                device_id,
                model_id,
                group_id,
                plan_id,
            } => write!(
                f,
                "add-ons {}/{} plan {} @ group {}",
                device_id, model_id, plan_id, group_id
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Fetched {
    Pricing(DevicePricing),
    AddOns(Vec<AddOn>),
}

/// Per-item result submitted to the accumulator
#[derive(Debug, Clone)]
pub enum WorkOutcome {
    Fetched { item: WorkItem, data: Fetched },
    Skipped { item: WorkItem, reason: String },
}

impl WorkOutcome {
    pub fn item(&self) -> &WorkItem {
        match self {
            Self::Fetched { item, .. } | Self::Skipped { item, .. } => item,
        }
    }
}
