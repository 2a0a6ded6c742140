//! Wire record → snapshot model conversion

use crate::catalog::{AddOnRequest, PricingRequest};
use crate::models::catalog::{AddOnRecord, PhoneModel, PhoneRecord, PlanRecord};
use crate::models::snapshot::round_cents;
use crate::models::{normalize_storage_label, AddOn, Device, PricingRow, StorageVariant};

pub fn device_from_record(record: PhoneRecord) -> Device {
    let display_name = format!("{} {}", record.brand.trim(), record.name.trim())
        .trim()
        .to_string();

    let mut device = Device {
        id: record.id,
        slug: record.slug,
        display_name,
        variants: Vec::new(),
    };
    device.merge_variants(variants_from_models(&record.models));
    device
}

/// Models without a storage capacity cannot be queried and are left out
pub fn variants_from_models(models: &[PhoneModel]) -> Vec<StorageVariant> {
    models
        .iter()
        .filter_map(|model| {
            model.storage.map(|gb| StorageVariant {
                capacity_label: normalize_storage_label(&gb.to_string()),
                model_id: model.id.clone(),
            })
        })
        .collect()
}

/// Flatten a phone detail response into pricing rows for `request`.
/// Models without a storage capacity are skipped, as in `variants_from_models`.
///
/// Rows are emitted in response order so that a later duplicate of the same
/// (device, model, group, plan) key supersedes an earlier one when merged.
pub fn pricing_rows(
    request: &PricingRequest,
    record: &PhoneRecord,
    default_term_months: u32,
) -> Vec<PricingRow> {
    let wanted = request.storage.as_deref().map(normalize_storage_label);

    record
        .models
        .iter()
        .filter(|model| match (&wanted, model.storage) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(label), Some(gb)) => normalize_storage_label(&gb.to_string()) == *label,
        })
        .flat_map(|model| {
            model.plans.iter().filter_map(move |plan| {
                plan_row(request, &model.id, plan, default_term_months)
            })
        })
        .collect()
}

fn plan_row(
    request: &PricingRequest,
    model_id: &str,
    plan: &PlanRecord,
    default_term_months: u32,
) -> Option<PricingRow> {
    let financed_monthly = plan.financing.as_ref().and_then(|f| f.price_after_discount);
    let monthly_price = match financed_monthly.or(plan.price) {
        Some(price) => price,
        None => {
            tracing::debug!(plan_id = %plan.id, slug = %request.slug, "Plan has no price, skipping");
            return None;
        }
    };

    let bring_it_back_monthly = plan
        .upfront
        .as_ref()
        .and_then(|u| u.price_after_discount)
        .unwrap_or(monthly_price);

    let term_months = plan
        .term
        .filter(|t| *t > 0)
        .unwrap_or(default_term_months);

    Some(PricingRow {
        device_id: request.device_id.clone(),
        model_id: model_id.to_string(),
        group_id: request.group_id.clone(),
        plan_id: plan.id.clone(),
        plan_name: plan.title.trim().to_string(),
        plan_data: plan.data.as_ref().and_then(data_label),
        plan_price: plan.price.unwrap_or(monthly_price),
        monthly_price,
        bring_it_back_monthly,
        upfront_price: plan
            .upfront
            .as_ref()
            .and_then(|u| u.buyout_price)
            .unwrap_or(0.0),
        financed_total: round_cents(monthly_price * f64::from(term_months)),
        term_months,
    })
}

fn data_label(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(format!("{n}GB")),
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub fn add_on_from_record(request: &AddOnRequest, record: AddOnRecord) -> AddOn {
    AddOn {
        id: record.id,
        name: record.name.trim().trim_end_matches(" -").trim().to_string(),
        price: record.price,
        is_free: record.is_free,
        plan_id: request.plan_id.clone(),
        group_id: request.group_id.clone(),
        device_id: request.device_id.clone(),
    }
}
