//! The discovery entry point: query → search → candidates → extraction →
//! ranking.

use std::time::Duration;

use buyspy_core::{Country, PipelineConfig, RankedResult};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::analyze::PageAnalyzer;
use crate::coordinator::{CoordinatorSettings, ExtractionCoordinator};
use crate::error::{PipelineError, SearchError};
use crate::normalize::normalize_candidates;
use crate::query::formulate_query;
use crate::rank::build_ranked_result;
use crate::search::{collect_search_results, SearchCapability};
use crate::tier::TierClassifier;

/// Stand-in for budgets too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_from_now(budget: Duration) -> tokio::time::Instant {
    let now = tokio::time::Instant::now();
    now.checked_add(budget).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub per_domain_cap: usize,
    pub concurrency: usize,
    pub task_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub search_retry_backoff_ms: u64,
    /// Wall-clock budget for a whole `discover_prices` call.
    pub deadline: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            per_domain_cap: 2,
            concurrency: 4,
            task_timeout: Duration::from_secs(30),
            max_retries: 1,
            retry_backoff_ms: 500,
            search_retry_backoff_ms: 1_000,
            deadline: Duration::from_secs(90),
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            per_domain_cap: config.per_domain_cap,
            concurrency: config.concurrency,
            task_timeout: config.task_timeout(),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            search_retry_backoff_ms: config.search_retry_backoff_ms,
            deadline: config.deadline(),
        }
    }

    fn coordinator(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            concurrency: self.concurrency,
            task_timeout: self.task_timeout,
            max_retries: self.max_retries,
            retry_backoff_ms: self.retry_backoff_ms,
        }
    }
}

/// Successful result of a discovery run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscoveryOutcome {
    Found(RankedResult),
    /// Search worked but yielded no usable candidate URLs.
    NoResultsFound { product: String, country: Country },
}

impl DiscoveryOutcome {
    /// The ranked result, empty for [`DiscoveryOutcome::NoResultsFound`].
    #[must_use]
    pub fn into_ranked(self) -> RankedResult {
        match self {
            DiscoveryOutcome::Found(result) => result,
            DiscoveryOutcome::NoResultsFound { product, country } => {
                RankedResult::empty(&product, country)
            }
        }
    }
}

/// Price discovery over injected search and page-analysis capabilities.
pub struct PricePipeline<S, A> {
    search: S,
    analyzer: A,
    classifier: TierClassifier,
    settings: PipelineSettings,
}

impl<S, A> PricePipeline<S, A>
where
    S: SearchCapability,
    A: PageAnalyzer,
{
    pub fn new(
        search: S,
        analyzer: A,
        classifier: TierClassifier,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            search,
            analyzer,
            classifier,
            settings,
        }
    }

    /// Finds and ranks store offers for `product` in `country`.
    ///
    /// At most `max_candidates` search results are considered. The call
    /// returns by the configured deadline with whatever extractions have
    /// completed.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidInput`] for an empty product, an unknown
    ///   country code, or `max_candidates == 0`.
    /// - [`PipelineError::SearchUnavailable`] if search fails after its
    ///   retry.
    /// - [`PipelineError::AllCandidatesFailed`] if candidates existed but
    ///   none produced an offer.
    pub async fn discover_prices(
        &self,
        product: &str,
        country: &str,
        max_candidates: usize,
    ) -> Result<DiscoveryOutcome, PipelineError> {
        let span = tracing::info_span!(
            "discover_prices",
            run_id = %Uuid::new_v4(),
            product,
            country
        );
        self.discover(product, country, max_candidates)
            .instrument(span)
            .await
    }

    async fn discover(
        &self,
        product: &str,
        country: &str,
        max_candidates: usize,
    ) -> Result<DiscoveryOutcome, PipelineError> {
        if max_candidates == 0 {
            return Err(PipelineError::InvalidInput(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        let query = formulate_query(product, country)?;
        let deadline = deadline_from_now(self.settings.deadline);

        let search = collect_search_results(
            &self.search,
            &query,
            max_candidates,
            self.settings.search_retry_backoff_ms,
        );
        let hits = tokio::time::timeout_at(deadline, search)
            .await
            .map_err(|_| PipelineError::SearchUnavailable {
                query: query.query().to_string(),
                source: SearchError::Backend(
                    "search did not finish before the pipeline deadline".to_string(),
                ),
            })??;

        let candidates = normalize_candidates(
            hits.iter().map(|h| h.url.as_str()),
            self.settings.per_domain_cap,
        );
        if candidates.is_empty() {
            tracing::info!(hits = hits.len(), "no usable candidate URLs");
            return Ok(DiscoveryOutcome::NoResultsFound {
                product: query.product().to_string(),
                country: query.country().clone(),
            });
        }

        let candidates = self.classifier.annotate(candidates, query.country());
        let candidate_count = candidates.len();
        tracing::info!(candidates = candidate_count, "starting extraction");

        let coordinator_settings = self.settings.coordinator();
        let coordinator = ExtractionCoordinator::new(
            &self.analyzer,
            &coordinator_settings,
            query.country(),
            query.product(),
        );
        let report = coordinator.run(candidates, deadline).await;

        let records = report.records();
        tracing::info!(
            succeeded = records.len(),
            failed = report.outcomes.len() - report.succeeded(),
            cancelled = report.cancelled,
            deadline_hit = report.deadline_hit,
            "extraction finished"
        );

        if records.is_empty() {
            return Err(PipelineError::AllCandidatesFailed {
                candidates: candidate_count,
            });
        }

        Ok(DiscoveryOutcome::Found(build_ranked_result(
            query.product(),
            query.country().clone(),
            records,
        )))
    }
}
