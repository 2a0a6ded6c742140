/// Integration tests for the aggregation pipeline against an in-memory catalog
use async_trait::async_trait;
use plan_pricing::catalog::{AddOnRequest, CatalogSource, DevicePricing, PricingRequest};
use plan_pricing::config::Config;
use plan_pricing::error::{CatalogError, PipelineError};
use plan_pricing::models::catalog::{GroupDetail, GroupSummary, MemberGroup};
use plan_pricing::models::{AddOn, Device, PricingRow, StorageVariant};
use plan_pricing::pipeline::{self, summary::FetchFamily};
use plan_pricing::store;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scriptable catalog: every device has one 128GB model priced by one plan
#[derive(Default)]
struct FakeCatalog {
    companies: Vec<(String, String)>,
    member_groups: Vec<(String, String)>,
    devices: Vec<Device>,
    /// (slug, group) pairs whose pricing lookup is NotFound
    missing_pricing: HashSet<(String, String)>,
    /// (slug, group) pairs that fail transiently on the first attempt
    flaky_pricing: HashSet<(String, String)>,
    /// Plans whose add-on lookup is rejected
    failing_add_ons: HashSet<String>,
    /// Emit every pricing row twice, the second with a lower price
    duplicate_rows: bool,
    /// Stamp pricing rows with a group that was never enumerated
    dangling_group: bool,
    fail_device_catalog: bool,
    pricing_calls: Mutex<HashMap<(String, String), usize>>,
    add_on_calls: AtomicUsize,
}

impl FakeCatalog {
    fn with_catalog(devices: usize, groups: usize) -> Self {
        Self {
            companies: vec![("c1".to_string(), "Acme Corp".to_string())],
            member_groups: (1..=groups)
                .map(|i| (format!("g{}", i), format!("Acme Group {}", i)))
                .collect(),
            devices: (1..=devices).map(device).collect(),
            ..Default::default()
        }
    }

    fn pricing_attempts(&self, slug: &str, group_id: &str) -> usize {
        self.pricing_calls
            .lock()
            .unwrap()
            .get(&(slug.to_string(), group_id.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

fn device(n: usize) -> Device {
    Device {
        id: format!("d{}", n),
        slug: format!("phone-{}", n),
        display_name: format!("Phone {}", n),
        variants: vec![],
    }
}

fn row(request: &PricingRequest, monthly: f64) -> PricingRow {
    PricingRow {
        device_id: request.device_id.clone(),
        model_id: format!("{}-128", request.device_id),
        group_id: request.group_id.clone(),
        plan_id: "p1".to_string(),
        plan_name: "Essentials".to_string(),
        plan_data: Some("50GB".to_string()),
        plan_price: 40.0,
        monthly_price: monthly,
        upfront_price: 0.0,
        bring_it_back_monthly: monthly,
        financed_total: monthly * 24.0,
        term_months: 24,
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_groups(&self, search_term: &str) -> Result<Vec<GroupSummary>, CatalogError> {
        Ok(self
            .companies
            .iter()
            .filter(|(_, name)| name.to_lowercase().contains(search_term))
            .map(|(id, name)| GroupSummary {
                id: id.clone(),
                name: name.clone(),
            })
            .collect())
    }

    async fn get_group_detail(&self, group_id: &str) -> Result<GroupDetail, CatalogError> {
        let (id, name) = self
            .companies
            .iter()
            .find(|(id, _)| id == group_id)
            .ok_or_else(|| CatalogError::NotFound(group_id.to_string()))?;

        Ok(GroupDetail {
            id: id.clone(),
            name: name.clone(),
            groups: self
                .member_groups
                .iter()
                .map(|(id, name)| MemberGroup {
                    id: id.clone(),
                    name: name.clone(),
                })
                .collect(),
        })
    }

    async fn list_devices(&self) -> Result<Vec<Device>, CatalogError> {
        if self.fail_device_catalog {
            return Err(CatalogError::Decode("garbled device list".to_string()));
        }
        Ok(self.devices.clone())
    }

    async fn get_device_pricing(&self, request: &PricingRequest) -> Result<DevicePricing, CatalogError> {
        let key = (request.slug.clone(), request.group_id.clone());
        let attempt = {
            let mut calls = self.pricing_calls.lock().unwrap();
            let count = calls.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if self.missing_pricing.contains(&key) {
            return Err(CatalogError::NotFound(request.slug.clone()));
        }
        if self.flaky_pricing.contains(&key) && attempt == 1 {
            return Err(CatalogError::Transient("connection reset".to_string()));
        }

        let mut rows = vec![row(request, 55.0)];
        if self.duplicate_rows {
            rows.push(row(request, 49.0));
        }
        if self.dangling_group {
            for r in &mut rows {
                r.group_id = "ghost".to_string();
            }
        }

        Ok(DevicePricing {
            variants: vec![StorageVariant {
                capacity_label: "128GB".to_string(),
                model_id: format!("{}-128", request.device_id),
            }],
            rows,
        })
    }

    async fn list_add_ons(&self, request: &AddOnRequest) -> Result<Vec<AddOn>, CatalogError> {
        self.add_on_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_add_ons.contains(&request.plan_id) {
            return Err(CatalogError::Rejected {
                status: reqwest::StatusCode::FORBIDDEN,
                message: "not allowed".to_string(),
            });
        }

        Ok(vec![AddOn {
            id: "a1".to_string(),
            name: "Caller ID".to_string(),
            price: 0.0,
            is_free: true,
            plan_id: request.plan_id.clone(),
            group_id: request.group_id.clone(),
            device_id: request.device_id.clone(),
        }])
    }
}

fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.pipeline.search_terms = vec!["acme".to_string()];
    cfg.pipeline.concurrency = 4;
    cfg.pipeline.retry_attempts = 2;
    cfg.pipeline.retry_backoff_ms = 1;
    cfg
}

#[tokio::test]
async fn test_one_failed_item_is_skipped_and_counted() {
    let mut fake = FakeCatalog::with_catalog(5, 2);
    fake.missing_pricing
        .insert(("phone-3".to_string(), "g2".to_string()));
    let fake = Arc::new(fake);

    let report = pipeline::run(fake.clone(), &test_config()).await.unwrap();

    assert_eq!(report.summary.pricing.attempted, 10);
    assert_eq!(report.summary.pricing.succeeded, 9);
    assert_eq!(report.snapshot.pricing.len(), 9);
    assert!(!report.summary.is_complete());
    assert_eq!(report.summary.skipped.len(), 1);
    assert_eq!(report.summary.skipped[0].family, FetchFamily::Pricing);
    assert!(report.summary.skipped[0].item.contains("phone-3"));
    assert!(report.summary.to_string().contains("pricing 9/10"));

    // NotFound is not retried
    assert_eq!(fake.pricing_attempts("phone-3", "g2"), 1);
    assert!(!report
        .snapshot
        .pricing
        .iter()
        .any(|r| r.device_id == "d3" && r.group_id == "g2"));
}

#[tokio::test]
async fn test_snapshot_contents() {
    let fake = Arc::new(FakeCatalog::with_catalog(2, 2));

    let report = pipeline::run(fake.clone(), &test_config()).await.unwrap();
    let snapshot = &report.snapshot;

    assert!(report.summary.is_complete());
    assert_eq!(snapshot.groups.len(), 2);
    assert_eq!(snapshot.groups[0].id, "g1");
    assert_eq!(snapshot.groups[0].search_key, "acme");
    assert_eq!(snapshot.groups[0].companies, vec!["Acme Corp"]);
    assert_eq!(snapshot.devices.len(), 2);
    assert_eq!(snapshot.devices["d1"].storage_labels(), vec!["128GB"]);
    assert_eq!(snapshot.pricing.len(), 4);

    // One add-on lookup per fetched pricing row
    assert_eq!(fake.add_on_calls.load(Ordering::SeqCst), 4);
    assert_eq!(snapshot.add_ons.len(), 4);
    assert_eq!(report.summary.add_ons.succeeded, 4);
    assert!(snapshot.check_integrity().is_ok());
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mut fake = FakeCatalog::with_catalog(1, 1);
    fake.flaky_pricing
        .insert(("phone-1".to_string(), "g1".to_string()));
    let fake = Arc::new(fake);

    let report = pipeline::run(fake.clone(), &test_config()).await.unwrap();

    assert_eq!(fake.pricing_attempts("phone-1", "g1"), 2);
    assert_eq!(report.summary.pricing.succeeded, 1);
    assert_eq!(report.snapshot.pricing.len(), 1);
}

#[tokio::test]
async fn test_duplicate_rows_keep_the_later_one() {
    let mut fake = FakeCatalog::with_catalog(1, 1);
    fake.duplicate_rows = true;

    let report = pipeline::run(Arc::new(fake), &test_config()).await.unwrap();

    assert_eq!(report.snapshot.pricing.len(), 1);
    assert_eq!(report.snapshot.pricing[0].monthly_price, 49.0);
}

#[tokio::test]
async fn test_repeated_device_id_keeps_the_later_entry() {
    let mut fake = FakeCatalog::with_catalog(2, 1);
    fake.devices.push(Device {
        slug: "phone-1-renamed".to_string(),
        ..device(1)
    });
    let fake = Arc::new(fake);

    let report = pipeline::run(fake.clone(), &test_config()).await.unwrap();

    assert_eq!(report.snapshot.devices.len(), 2);
    assert_eq!(report.snapshot.devices["d1"].slug, "phone-1-renamed");
    assert_eq!(fake.pricing_attempts("phone-1-renamed", "g1"), 1);
    assert_eq!(fake.pricing_attempts("phone-1", "g1"), 0);
    assert_eq!(report.summary.pricing.attempted, 2);
    assert_eq!(report.snapshot.pricing.len(), 2);
    assert!(report.snapshot.check_integrity().is_ok());
}

#[tokio::test]
async fn test_group_shared_by_companies_lists_both() {
    let mut fake = FakeCatalog::with_catalog(1, 1);
    fake.companies = vec![
        ("c1".to_string(), "Acme Corp".to_string()),
        ("c2".to_string(), "Beta Corp".to_string()),
    ];
    let mut cfg = test_config();
    cfg.pipeline.search_terms = vec!["corp".to_string()];

    let report = pipeline::run(Arc::new(fake), &cfg).await.unwrap();

    assert_eq!(report.snapshot.groups.len(), 1);
    assert_eq!(report.snapshot.groups[0].id, "g1");
    assert_eq!(report.snapshot.groups[0].companies, vec!["Acme Corp", "Beta Corp"]);
    assert_eq!(report.summary.group_details.succeeded, 2);
    assert_eq!(report.snapshot.pricing.len(), 1);
}

#[tokio::test]
async fn test_add_on_failure_is_skipped() {
    let mut fake = FakeCatalog::with_catalog(2, 1);
    fake.failing_add_ons.insert("p1".to_string());

    let report = pipeline::run(Arc::new(fake), &test_config()).await.unwrap();

    assert_eq!(report.snapshot.pricing.len(), 2);
    assert!(report.snapshot.add_ons.is_empty());
    assert_eq!(report.summary.add_ons.attempted, 2);
    assert_eq!(report.summary.add_ons.failed(), 2);
}

#[tokio::test]
async fn test_no_groups_aborts_without_writing() {
    let mut fake = FakeCatalog::with_catalog(3, 2);
    fake.companies.clear();

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("final_data.json");
    let result = pipeline::run_and_save(Arc::new(fake), &test_config(), &destination).await;

    assert!(matches!(result, Err(PipelineError::NoGroups)));
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_device_catalog_failure_aborts() {
    let mut fake = FakeCatalog::with_catalog(3, 2);
    fake.fail_device_catalog = true;

    let result = pipeline::run(Arc::new(fake), &test_config()).await;
    assert!(matches!(result, Err(PipelineError::DeviceCatalog(_))));
}

#[tokio::test]
async fn test_empty_device_catalog_aborts() {
    let fake = FakeCatalog::with_catalog(0, 2);

    let result = pipeline::run(Arc::new(fake), &test_config()).await;
    assert!(matches!(result, Err(PipelineError::NoDevices)));
}

#[tokio::test]
async fn test_integrity_defect_aborts_without_writing() {
    let mut fake = FakeCatalog::with_catalog(1, 1);
    fake.dangling_group = true;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("final_data.json");
    let result = pipeline::run_and_save(Arc::new(fake), &test_config(), &destination).await;

    assert!(matches!(result, Err(PipelineError::Integrity(_))));
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_run_and_save_persists_loadable_snapshot() {
    let fake = Arc::new(FakeCatalog::with_catalog(2, 2));

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("data").join("final_data.json");
    let report = pipeline::run_and_save(fake, &test_config(), &destination)
        .await
        .unwrap();

    let loaded = store::load(&destination).unwrap();
    assert_eq!(loaded, report.snapshot);
}
