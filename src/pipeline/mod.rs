//! Aggregation pipeline
//!
//! 1. search eligibility groups by the configured terms
//! 2. resolve each hit to its member pricing groups
//! 3. fetch the device catalog once
//! 4. fan out one pricing work item per (device, group); every fetched row
//!    fans out again to an add-on lookup
//! 5. merge everything through the single-owner accumulator
//!
//! Per-item failures are logged, counted and skipped. Only zero groups, zero
//! devices, a failed device catalog fetch or an integrity defect abort the run.

pub mod accumulator;
pub mod summary;
pub mod work;

use crate::catalog::{AddOnRequest, CatalogSource, PricingContext, PricingRequest};
use crate::config::Config;
use crate::error::{CatalogError, PipelineError};
use crate::metrics;
use crate::models::catalog::{GroupDetail, GroupSummary};
use crate::models::{Device, EligibilityGroup, Snapshot};
use crate::retry::{with_retry, RetryPolicy};
use crate::store;
use accumulator::{AccumulatorHandle, SnapshotBuilder};
use chrono::Utc;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use summary::{CompletenessSummary, FetchFamily};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use work::{Fetched, WorkItem, WorkOutcome};

pub use summary::FetchTally;

/// Output of a successful run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub snapshot: Snapshot,
    pub summary: CompletenessSummary,
}

/// Search terms for group enumeration: the configured list, or the generated
/// alphabet (a-z, 0-9, then every two-character combination) when empty.
pub fn search_terms(configured: &[String]) -> Vec<String> {
    if !configured.is_empty() {
        return configured.iter().map(|t| t.trim().to_string()).collect();
    }

    let alphabet: Vec<char> = ('a'..='z').chain('0'..='9').collect();
    let mut terms: Vec<String> = alphabet.iter().map(|c| c.to_string()).collect();
    for first in &alphabet {
        for second in &alphabet {
            terms.push(format!("{}{}", first, second));
        }
    }
    terms
}

/// Run a full aggregation against `source`
pub async fn run(source: Arc<dyn CatalogSource>, config: &Config) -> Result<PipelineReport, PipelineError> {
    let started_at = Utc::now();
    let clock = Instant::now();
    let crawler = Crawler::new(source, config);
    let mut summary = CompletenessSummary::default();

    let terms = search_terms(&config.pipeline.search_terms);
    info!(terms = terms.len(), concurrency = crawler.concurrency, "Searching eligibility groups");
    let hits = crawler.search_groups(&terms, &mut summary).await;

    info!(hits = hits.len(), "Resolving group details");
    let (groups, company_for_group) = crawler.resolve_groups(hits, &mut summary).await;
    if groups.is_empty() {
        return Err(PipelineError::NoGroups);
    }

    let devices = crawler
        .call("list_devices", || crawler.source.list_devices())
        .await
        .map_err(PipelineError::DeviceCatalog)?;
    if devices.is_empty() {
        return Err(PipelineError::NoDevices);
    }

    let items = pricing_items(&devices, &groups);
    info!(
        groups = groups.len(),
        devices = devices.len(),
        work_items = items.len(),
        "Fetching device pricing"
    );

    let (handle, task) = accumulator::spawn(SnapshotBuilder::new(groups, devices, summary));
    {
        let crawler = &crawler;
        let company_for_group = &company_for_group;
        let handle = &handle;
        stream::iter(items)
            .for_each_concurrent(crawler.concurrency, move |item| async move {
                crawler.process_pricing(item, company_for_group, handle).await;
            })
            .await;
    }
    drop(handle);

    let builder = task
        .await
        .map_err(|e| PipelineError::Accumulator(e.to_string()))?;
    let (snapshot, summary) = builder.finish(started_at)?;

    metrics::record_run(clock.elapsed(), snapshot.pricing.len());
    if summary.is_complete() {
        info!(summary = %summary, elapsed_ms = clock.elapsed().as_millis(), "Aggregation complete");
    } else {
        warn!(
            summary = %summary,
            skipped = summary.skipped.len(),
            elapsed_ms = clock.elapsed().as_millis(),
            "Aggregation finished with partial coverage"
        );
    }

    Ok(PipelineReport { snapshot, summary })
}

/// Run and persist. Nothing is written when the run fails.
pub async fn run_and_save(
    source: Arc<dyn CatalogSource>,
    config: &Config,
    destination: &Path,
) -> Result<PipelineReport, PipelineError> {
    let report = run(source, config).await?;
    store::save(&report.snapshot, destination)?;
    Ok(report)
}

/// Duplicate device ids collapse with the later entry winning, matching
/// `SnapshotBuilder::new`.
fn pricing_items(devices: &[Device], groups: &[EligibilityGroup]) -> Vec<WorkItem> {
    let devices: BTreeMap<&str, &Device> = devices.iter().map(|d| (d.id.as_str(), d)).collect();

    devices
        .values()
        .flat_map(|device| {
            groups.iter().map(move |group| WorkItem::Pricing {
                device_id: device.id.clone(),
                slug: device.slug.clone(),
                group_id: group.id.clone(),
            })
        })
        .collect()
}

/// Shared fetch machinery: bounded in-flight calls plus coarse retries
struct Crawler {
    source: Arc<dyn CatalogSource>,
    permits: Semaphore,
    concurrency: usize,
    retry: RetryPolicy,
    context: PricingContext,
}

impl Crawler {
    fn new(source: Arc<dyn CatalogSource>, config: &Config) -> Self {
        let concurrency = config.pipeline.concurrency.max(1);
        Self {
            source,
            permits: Semaphore::new(concurrency),
            concurrency,
            retry: RetryPolicy::new(
                config.pipeline.retry_attempts,
                Duration::from_millis(config.pipeline.retry_backoff_ms),
            ),
            context: PricingContext::from(&config.catalog),
        }
    }

    async fn call<T, F, Fut>(&self, operation: &str, request_fn: F) -> Result<T, CatalogError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CatalogError::Transient("fetch pool closed".to_string()))?;
        with_retry(self.retry, operation, request_fn).await
    }

    /// Search every term; hits de-duplicated by id, first term wins
    async fn search_groups(
        &self,
        terms: &[String],
        summary: &mut CompletenessSummary,
    ) -> Vec<(GroupSummary, String)> {
        let results: Vec<_> = stream::iter(terms)
            .map(move |term| async move {
                let result = self
                    .call("list_groups", || self.source.list_groups(term))
                    .await;
                (term, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        for (term, result) in results {
            match result {
                Ok(found) => {
                    summary.record_success(FetchFamily::GroupSearch);
                    metrics::record_fetch(FetchFamily::GroupSearch.as_str(), "success");
                    for hit in found {
                        if seen.insert(hit.id.clone()) {
                            hits.push((hit, term.clone()));
                        }
                    }
                }
                Err(e) => {
                    warn!(term = %term, error = %e, "Group search failed, skipping term");
                    metrics::record_fetch(FetchFamily::GroupSearch.as_str(), e.kind());
                    summary.record_skip(FetchFamily::GroupSearch, format!("search '{}'", term), e.to_string());
                }
            }
        }
        hits
    }

    /// Resolve hits into eligibility groups keyed by company-group id.
    /// Also returns, per group, the first member company id for add-on lookups.
    async fn resolve_groups(
        &self,
        hits: Vec<(GroupSummary, String)>,
        summary: &mut CompletenessSummary,
    ) -> (Vec<EligibilityGroup>, BTreeMap<String, String>) {
        let results: Vec<(GroupSummary, String, Result<GroupDetail, CatalogError>)> = stream::iter(hits)
            .map(move |(hit, term)| async move {
                let result = self
                    .call("get_group_detail", || self.source.get_group_detail(&hit.id))
                    .await;
                (hit, term, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut groups: BTreeMap<String, EligibilityGroup> = BTreeMap::new();
        let mut company_for_group: BTreeMap<String, String> = BTreeMap::new();

        for (hit, term, result) in results {
            let detail = match result {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(group_id = %hit.id, name = %hit.name, error = %e, "Group detail failed, skipping");
                    metrics::record_fetch(FetchFamily::GroupDetail.as_str(), e.kind());
                    summary.record_skip(
                        FetchFamily::GroupDetail,
                        format!("detail {} ({})", hit.id, hit.name),
                        e.to_string(),
                    );
                    continue;
                }
            };

            summary.record_success(FetchFamily::GroupDetail);
            metrics::record_fetch(FetchFamily::GroupDetail.as_str(), "success");

            for member in detail.groups {
                company_for_group
                    .entry(member.id.clone())
                    .or_insert_with(|| detail.id.clone());
                groups
                    .entry(member.id.clone())
                    .or_insert_with(|| EligibilityGroup {
                        id: member.id.clone(),
                        name: member.name.clone(),
                        search_key: term.clone(),
                        companies: Vec::new(),
                    })
                    .companies
                    .push(detail.name.clone());
            }
        }

        let groups = groups
            .into_values()
            .map(|mut group| {
                group.companies.sort();
                group.companies.dedup();
                group
            })
            .collect();

        (groups, company_for_group)
    }

    async fn process_pricing(
        &self,
        item: WorkItem,
        company_for_group: &BTreeMap<String, String>,
        handle: &AccumulatorHandle,
    ) {
        let WorkItem::Pricing {
            device_id,
            slug,
            group_id,
        } = &item
        else {
            return;
        };
        let company_id = company_for_group.get(group_id).cloned().unwrap_or_default();

        let request = PricingRequest {
            device_id: device_id.clone(),
            slug: slug.clone(),
            group_id: group_id.clone(),
            storage: None,
            context: self.context.clone(),
        };

        let pricing = match self
            .call("get_device_pricing", || self.source.get_device_pricing(&request))
            .await
        {
            Ok(pricing) => pricing,
            Err(e) => {
                warn!(slug = %slug, group_id = %group_id, error = %e, "Pricing fetch failed, skipping");
                metrics::record_fetch(FetchFamily::Pricing.as_str(), e.kind());
                handle.submit(WorkOutcome::Skipped {
                    item,
                    reason: e.to_string(),
                });
                return;
            }
        };
        metrics::record_fetch(FetchFamily::Pricing.as_str(), "success");

        let add_on_requests: Vec<AddOnRequest> = pricing
            .rows
            .iter()
            .map(|row| AddOnRequest {
                company_id: company_id.clone(),
                group_id: row.group_id.clone(),
                device_id: row.device_id.clone(),
                model_id: row.model_id.clone(),
                plan_id: row.plan_id.clone(),
                context: self.context.clone(),
            })
            .collect();

        handle.submit(WorkOutcome::Fetched {
            item,
            data: Fetched::Pricing(pricing),
        });

        join_all(
            add_on_requests
                .iter()
                .map(|request| self.process_add_ons(request, handle)),
        )
        .await;
    }

    async fn process_add_ons(&self, request: &AddOnRequest, handle: &AccumulatorHandle) {
        let item = WorkItem::AddOns {
            device_id: request.device_id.clone(),
            model_id: request.model_id.clone(),
            group_id: request.group_id.clone(),
            plan_id: request.plan_id.clone(),
        };

        match self
            .call("list_add_ons", || self.source.list_add_ons(request))
            .await
        {
            Ok(add_ons) => {
                metrics::record_fetch(FetchFamily::AddOns.as_str(), "success");
                handle.submit(WorkOutcome::Fetched {
                    item,
                    data: Fetched::AddOns(add_ons),
                });
            }
            Err(e) => {
                warn!(item = %item, error = %e, "Add-on fetch failed, skipping");
                metrics::record_fetch(FetchFamily::AddOns.as_str(), e.kind());
                handle.submit(WorkOutcome::Skipped {
                    item,
                    reason: e.to_string(),
                });
            }
        }
    }
}
