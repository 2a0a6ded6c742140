//! Data models
//!
//! - `catalog`: wire shapes returned by the remote catalog API
//! - `snapshot`: the normalized dataset persisted between collection and comparison

pub mod catalog;
pub mod snapshot;

pub use snapshot::{
    normalize_storage_label, AddOn, Device, EligibilityGroup, PricingKey, PricingRow, Snapshot,
    StorageVariant,
};
