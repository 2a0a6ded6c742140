use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the remote catalog client
///
/// An empty list is never an error: "no results" is a valid answer.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network failure, timeout or 5xx. Retryable by the caller.
    #[error("Transient fetch error: {0}")]
    Transient(String),
    /// The remote entity disappeared between enumeration and lookup
    #[error("Not found: {0}")]
    NotFound(String),
    /// Any other non-success status (4xx other than 404)
    #[error("Rejected by catalog ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Short label used in metrics and the completeness summary
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::NotFound(_) => "not_found",
            Self::Rejected { .. } => "rejected",
            Self::Decode(_) => "decode",
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            return Self::Transient(err.to_string());
        }
        if let Some(status) = err.status() {
            if status.is_server_error() {
                return Self::Transient(err.to_string());
            }
            if status == StatusCode::NOT_FOUND {
                return Self::NotFound(err.to_string());
            }
            return Self::Rejected {
                status,
                message: err.to_string(),
            };
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Transient(err.to_string())
    }
}

/// Snapshot persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Input is not well-formed JSON
    #[error("Malformed snapshot {path}: {message}")]
    Parse { path: PathBuf, message: String },
    /// Well-formed JSON that lacks required fields or has mistyped ones
    #[error("Snapshot {path} does not match schema: {message}")]
    Schema { path: PathBuf, message: String },
}

/// A snapshot that violates its own referential invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("{record} references unknown device '{device_id}'")]
    UnknownDevice { record: String, device_id: String },
    #[error("{record} references unknown group '{group_id}'")]
    UnknownGroup { record: String, group_id: String },
}

/// Comparison query failures
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Device not found: {slug}{}", did_you_mean(.suggestions))]
    DeviceNotFound {
        slug: String,
        /// Known slugs containing the query, for "did you mean" hints
        suggestions: Vec<String>,
    },
    #[error("Storage variant {storage} not found for {slug} (available: {})", .available.join(", "))]
    VariantNotFound {
        slug: String,
        storage: String,
        available: Vec<String>,
    },
    #[error("Snapshot integrity defect: {0}")]
    DataIntegrity(#[from] IntegrityError),
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Structural failures that abort an aggregation run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No eligibility groups were collected; refusing to produce an empty snapshot")]
    NoGroups,
    #[error("Device catalog is empty; refusing to produce an empty snapshot")]
    NoDevices,
    #[error("Failed to fetch device catalog: {0}")]
    DeviceCatalog(#[source] CatalogError),
    #[error("Collected data failed integrity check: {0}")]
    Integrity(#[from] IntegrityError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Snapshot accumulator stopped unexpectedly: {0}")]
    Accumulator(String),
}
