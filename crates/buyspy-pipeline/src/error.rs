use thiserror::Error;

/// Errors surfaced to callers of the discovery pipeline.
///
/// Task-level extraction failures never appear here; they are absorbed and
/// logged by the extraction coordinator.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("search unavailable for \"{query}\": {source}")]
    SearchUnavailable {
        query: String,
        #[source]
        source: SearchError,
    },

    #[error("all {candidates} candidate pages failed extraction")]
    AllCandidatesFailed { candidates: usize },
}

/// Errors returned by a search capability.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by search backend (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("search backend error: {0}")]
    Backend(String),
}

/// Why a single page analysis attempt failed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("page analysis timed out after {timeout_ms}ms: {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("network failure fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("could not extract an offer from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("{url} is not a usable product page: {reason}")]
    NotCommerce { url: String, reason: String },

    #[error("aggregator page {url} could not be resolved: {reason}")]
    AggregatorResolution { url: String, reason: String },
}

/// Payload-free discriminant of [`ExtractionError`], recorded on tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionErrorKind {
    Timeout,
    Network,
    Parse,
    NotCommerce,
    AggregatorResolution,
}

impl ExtractionError {
    #[must_use]
    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            ExtractionError::Timeout { .. } => ExtractionErrorKind::Timeout,
            ExtractionError::Network { .. } => ExtractionErrorKind::Network,
            ExtractionError::Parse { .. } => ExtractionErrorKind::Parse,
            ExtractionError::NotCommerce { .. } => ExtractionErrorKind::NotCommerce,
            ExtractionError::AggregatorResolution { .. } => {
                ExtractionErrorKind::AggregatorResolution
            }
        }
    }

    /// Returns `true` if another attempt could plausibly succeed.
    ///
    /// Transient: [`ExtractionError::Timeout`], [`ExtractionError::Network`].
    /// Everything else describes the page itself and is final.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractionError::Timeout { .. } | ExtractionError::Network { .. }
        )
    }
}
