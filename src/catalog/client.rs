use crate::catalog::convert::{add_on_from_record, device_from_record, pricing_rows, variants_from_models};
use crate::catalog::{AddOnRequest, CatalogSource, DevicePricing, PricingContext, PricingRequest};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::models::catalog::{AddOnRecord, GroupDetail, GroupSummary, PhoneListResponse, PhoneRecord};
use crate::models::{AddOn, Device};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// reqwest-backed catalog client
#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    default_term_months: u32,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig, default_term_months: u32) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(concat!("plan-pricing/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Transient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_seconds),
            default_term_months,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &url, body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| CatalogError::Decode(format!("{}: {}", url, e)))
    }
}

fn status_error(status: StatusCode, url: &str, body: String) -> CatalogError {
    if status == StatusCode::NOT_FOUND {
        CatalogError::NotFound(url.to_string())
    } else if status.is_server_error() {
        CatalogError::Transient(format!("HTTP {} from {}", status, url))
    } else {
        CatalogError::Rejected {
            status,
            message: body,
        }
    }
}

fn context_params(context: &PricingContext) -> [(&'static str, String); 4] {
    [
        ("province", context.province.clone()),
        ("customerType", context.customer_type.clone()),
        ("customerLine", context.customer_line.clone()),
        ("isSalesRep", context.is_sales_rep.to_string()),
    ]
}

#[async_trait]
impl CatalogSource for HttpCatalogClient {
    async fn list_groups(&self, search_term: &str) -> Result<Vec<GroupSummary>, CatalogError> {
        self.get_json("companies/list", &[("name", search_term.to_string())])
            .await
    }

    async fn get_group_detail(&self, group_id: &str) -> Result<GroupDetail, CatalogError> {
        self.get_json(&format!("companies/get/{}", group_id), &[]).await
    }

    async fn list_devices(&self) -> Result<Vec<Device>, CatalogError> {
        let first: PhoneListResponse = self.get_json("phones/list", &[]).await?;
        let total_pages = first.total_pages.unwrap_or(1);
        let mut devices: Vec<Device> = first.phones.into_iter().map(device_from_record).collect();

        for page in 2..=total_pages {
            let next: PhoneListResponse = self
                .get_json("phones/list", &[("page", page.to_string())])
                .await?;
            devices.extend(next.phones.into_iter().map(device_from_record));
        }

        tracing::debug!(devices = devices.len(), pages = total_pages, "Fetched device catalog");
        Ok(devices)
    }

    async fn get_device_pricing(&self, request: &PricingRequest) -> Result<DevicePricing, CatalogError> {
        let mut query = vec![
            ("slug", request.slug.clone()),
            ("companyGroupsIds", request.group_id.clone()),
        ];
        query.extend(context_params(&request.context));

        let record: PhoneRecord = self.get_json("phones/detail", &query).await?;

        Ok(DevicePricing {
            variants: variants_from_models(&record.models),
            rows: pricing_rows(request, &record, self.default_term_months),
        })
    }

    async fn list_add_ons(&self, request: &AddOnRequest) -> Result<Vec<AddOn>, CatalogError> {
        let mut query = vec![
            ("companyId", request.company_id.clone()),
            ("companyGroupsIds", request.group_id.clone()),
        ];
        query.extend(context_params(&request.context));
        query.extend([
            ("phoneId", request.device_id.clone()),
            ("phoneModelId", request.model_id.clone()),
            ("planId", request.plan_id.clone()),
        ]);

        let records: Vec<AddOnRecord> = self.get_json("addons/list", &query).await?;
        Ok(records
            .into_iter()
            .map(|record| add_on_from_record(request, record))
            .collect())
    }
}
