//! Snapshot fixtures shared by the integration tests
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use plan_pricing::models::{AddOn, Device, EligibilityGroup, PricingRow, Snapshot, StorageVariant};
use std::collections::BTreeMap;

pub fn group(id: &str, name: &str) -> EligibilityGroup {
    EligibilityGroup {
        id: id.to_string(),
        name: name.to_string(),
        search_key: "a".to_string(),
        companies: vec![format!("{} Inc", name)],
    }
}

pub fn iphone() -> Device {
    Device {
        id: "d1".to_string(),
        slug: "apple-iphone-15".to_string(),
        display_name: "Apple iPhone 15".to_string(),
        variants: vec![
            StorageVariant {
                capacity_label: "128GB".to_string(),
                model_id: "m128".to_string(),
            },
            StorageVariant {
                capacity_label: "256GB".to_string(),
                model_id: "m256".to_string(),
            },
        ],
    }
}

pub fn iphone_pro() -> Device {
    Device {
        id: "d2".to_string(),
        slug: "apple-iphone-15-pro".to_string(),
        display_name: "Apple iPhone 15 Pro".to_string(),
        variants: vec![StorageVariant {
            capacity_label: "256GB".to_string(),
            model_id: "pro256".to_string(),
        }],
    }
}

pub fn row(
    device_id: &str,
    model_id: &str,
    group_id: &str,
    plan_id: &str,
    monthly: f64,
    upfront: f64,
) -> PricingRow {
    PricingRow {
        device_id: device_id.to_string(),
        model_id: model_id.to_string(),
        group_id: group_id.to_string(),
        plan_id: plan_id.to_string(),
        plan_name: format!("Plan {}", plan_id),
        plan_data: Some("100GB".to_string()),
        plan_price: 65.0,
        monthly_price: monthly,
        upfront_price: upfront,
        bring_it_back_monthly: monthly,
        financed_total: monthly * 24.0,
        term_months: 24,
    }
}

pub fn add_on(id: &str, device_id: &str, group_id: &str, plan_id: &str) -> AddOn {
    AddOn {
        id: id.to_string(),
        name: format!("Add-on {}", id),
        price: 5.0,
        is_free: false,
        plan_id: plan_id.to_string(),
        group_id: group_id.to_string(),
        device_id: device_id.to_string(),
    }
}

/// Two groups pricing the 128GB iPhone 15 on the same plan:
/// A at 55/mo with nothing upfront, B at 50/mo with 200 upfront.
pub fn snapshot() -> Snapshot {
    let devices: BTreeMap<String, Device> = [iphone(), iphone_pro()]
        .into_iter()
        .map(|d| (d.id.clone(), d))
        .collect();

    Snapshot {
        collected_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        groups: vec![group("gA", "Group A"), group("gB", "Group B")],
        devices,
        pricing: vec![
            row("d1", "m128", "gA", "p1", 55.0, 0.0),
            row("d1", "m128", "gB", "p1", 50.0, 200.0),
            row("d2", "pro256", "gA", "p2", 70.0, 0.0),
        ],
        add_ons: vec![
            add_on("a2", "d1", "gB", "p1"),
            add_on("a1", "d1", "gB", "p1"),
            add_on("a3", "d2", "gA", "p2"),
        ],
    }
}
