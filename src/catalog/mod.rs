//! Remote catalog access
//!
//! `CatalogSource` is the seam the aggregation pipeline depends on;
//! `HttpCatalogClient` is the reqwest implementation used in production.
//! All operations are read-only and idempotent.

pub mod client;
pub mod convert;

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::models::catalog::{GroupDetail, GroupSummary};
use crate::models::{AddOn, Device, PricingRow, StorageVariant};
use async_trait::async_trait;

pub use client::HttpCatalogClient;

/// Fixed customer context sent with pricing and add-on lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingContext {
    pub province: String,
    pub customer_type: String,
    pub customer_line: String,
    pub is_sales_rep: bool,
}

impl From<&CatalogConfig> for PricingContext {
    fn from(cfg: &CatalogConfig) -> Self {
        Self {
            province: cfg.province.clone(),
            customer_type: cfg.customer_type.clone(),
            customer_line: cfg.customer_line.clone(),
            is_sales_rep: cfg.is_sales_rep,
        }
    }
}

/// Pricing lookup for one device under one eligibility group
#[derive(Debug, Clone)]
pub struct PricingRequest {
    /// Catalog id of the device; stamped on every returned row
    pub device_id: String,
    pub slug: String,
    pub group_id: String,
    /// Restrict to one storage variant. `None` returns every variant.
    pub storage: Option<String>,
    pub context: PricingContext,
}

/// Add-on lookup key for one fetched pricing row
#[derive(Debug, Clone)]
pub struct AddOnRequest {
    pub company_id: String,
    pub group_id: String,
    pub device_id: String,
    pub model_id: String,
    pub plan_id: String,
    pub context: PricingContext,
}

/// Result of a device pricing lookup
#[derive(Debug, Clone, Default)]
pub struct DevicePricing {
    /// Storage variants seen in the response
    pub variants: Vec<StorageVariant>,
    pub rows: Vec<PricingRow>,
}

#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    /// Search eligibility groups by name. An empty list is a valid answer.
    async fn list_groups(&self, search_term: &str) -> Result<Vec<GroupSummary>, CatalogError>;

    /// Resolve a search hit to its member pricing groups.
    /// `NotFound` when the entity vanished since it was listed.
    async fn get_group_detail(&self, group_id: &str) -> Result<GroupDetail, CatalogError>;

    /// Full device catalog, every page exhausted
    async fn list_devices(&self) -> Result<Vec<Device>, CatalogError>;

    /// Pricing rows for a device under a group. An unknown storage variant
    /// yields no rows rather than an error.
    async fn get_device_pricing(&self, request: &PricingRequest) -> Result<DevicePricing, CatalogError>;

    async fn list_add_ons(&self, request: &AddOnRequest) -> Result<Vec<AddOn>, CatalogError>;
}
