use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Remote catalog endpoint and the fixed query context sent with pricing calls
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Per-call timeout
    pub timeout_seconds: u64,
    pub province: String,
    pub customer_type: String,
    pub customer_line: String,
    pub is_sales_rep: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.redwireless.ca/rpp".to_string(),
            timeout_seconds: 30,
            province: "ON".to_string(),
            customer_type: "AAL".to_string(),
            customer_line: "Primary".to_string(),
            is_sales_rep: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Group search terms. Empty means the generated alphabet
    /// (a-z, 0-9 and every two-character combination).
    pub search_terms: Vec<String>,
    /// Max concurrent work items and max concurrent remote calls
    pub concurrency: usize,
    /// Attempts per remote call; only transient failures are retried
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Used when the catalog omits a plan's term
    pub default_term_months: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_terms: Vec::new(),
            concurrency: 16,
            retry_attempts: 2,
            retry_backoff_ms: 500,
            default_term_months: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub snapshot_path: PathBuf,
    /// Directory for filtered comparison artifacts
    pub data_dir: PathBuf,
    /// When set, `collect` writes Prometheus exposition text here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/final_data.json"),
            data_dir: PathBuf::from("data"),
            metrics_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Load configuration from an optional TOML file plus `PLAN_PRICING__*`
/// environment overrides, e.g. `PLAN_PRICING__PIPELINE__CONCURRENCY=4`.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("PLAN_PRICING")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("pipeline.search_terms"),
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.catalog.base_url.trim().is_empty() {
        anyhow::bail!("catalog.base_url cannot be empty");
    }

    if cfg.catalog.timeout_seconds == 0 {
        anyhow::bail!("catalog.timeout_seconds must be greater than 0");
    }

    if cfg.pipeline.concurrency == 0 {
        anyhow::bail!("pipeline.concurrency must be at least 1");
    }

    if cfg.pipeline.retry_attempts == 0 {
        anyhow::bail!("pipeline.retry_attempts must be at least 1");
    }

    if cfg.pipeline.default_term_months == 0 {
        anyhow::bail!("pipeline.default_term_months must be greater than 0");
    }

    if cfg.pipeline.search_terms.iter().any(|t| t.trim().is_empty()) {
        anyhow::bail!("pipeline.search_terms cannot contain empty terms");
    }

    match cfg.logging.format.as_str() {
        "pretty" | "json" => {}
        other => anyhow::bail!("Invalid logging.format '{}': expected 'pretty' or 'json'", other),
    }

    Ok(())
}
