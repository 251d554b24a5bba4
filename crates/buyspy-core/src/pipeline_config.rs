use std::path::PathBuf;
use std::time::Duration;

use crate::ConfigError;

#[derive(Clone)]
pub struct PipelineConfig {
    pub search_api_key: Option<String>,
    pub search_base_url: String,
    pub log_level: String,
    pub retailers_path: Option<PathBuf>,
    pub max_candidates: usize,
    pub per_domain_cap: usize,
    pub concurrency: usize,
    pub task_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub search_retry_backoff_ms: u64,
    pub deadline_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl PipelineConfig {
    #[must_use]
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// The search API key, required only by commands that search.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `BUYSPY_SEARCH_API_KEY` is
    /// unset or blank.
    pub fn require_search_api_key(&self) -> Result<&str, ConfigError> {
        self.search_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("BUYSPY_SEARCH_API_KEY".to_string()))
    }
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field(
                "search_api_key",
                &self.search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("search_base_url", &self.search_base_url)
            .field("log_level", &self.log_level)
            .field("retailers_path", &self.retailers_path)
            .field("max_candidates", &self.max_candidates)
            .field("per_domain_cap", &self.per_domain_cap)
            .field("concurrency", &self.concurrency)
            .field("task_timeout_secs", &self.task_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("search_retry_backoff_ms", &self.search_retry_backoff_ms)
            .field("deadline_secs", &self.deadline_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
