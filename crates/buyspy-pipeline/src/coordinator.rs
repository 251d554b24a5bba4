//! Bounded-concurrency extraction over tiered candidates under a
//! pipeline-wide deadline.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use buyspy_core::{CandidateUrl, Country, PriceRecord};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::analyze::{ExtractedOffer, PageAnalysis, PageAnalyzer};
use crate::error::ExtractionError;
use crate::normalize::{fetch_url, store_display_name, url_domain};
use crate::resolver::{resolve_aggregator, ChildResolution};
use crate::retry::backoff_delay;
use crate::task::{ExtractionTask, TaskOutcome, TaskState};

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Maximum tasks in flight at once.
    pub concurrency: usize,
    /// Budget for one analysis attempt.
    pub task_timeout: Duration,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

/// Append-only, shareable sink for task outcomes.
#[derive(Debug, Clone, Default)]
pub struct ResultsCollector {
    inner: Arc<Mutex<Vec<TaskOutcome>>>,
}

impl ResultsCollector {
    pub fn push(&self, outcome: TaskOutcome) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every outcome collected so far.
    #[must_use]
    pub fn drain(&self) -> Vec<TaskOutcome> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorReport {
    /// Outcomes of tasks that finished before the deadline, in completion
    /// order.
    pub outcomes: Vec<TaskOutcome>,
    /// Tasks cancelled in flight or never started.
    pub cancelled: usize,
    pub deadline_hit: bool,
}

impl CoordinatorReport {
    #[must_use]
    pub fn records(&self) -> Vec<PriceRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| o.record.clone())
            .collect()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }
}

/// Runs one [`ExtractionTask`] per candidate.
pub struct ExtractionCoordinator<'a, A: ?Sized> {
    analyzer: &'a A,
    settings: &'a CoordinatorSettings,
    country: &'a Country,
    product: &'a str,
}

impl<'a, A> ExtractionCoordinator<'a, A>
where
    A: PageAnalyzer + ?Sized,
{
    pub fn new(
        analyzer: &'a A,
        settings: &'a CoordinatorSettings,
        country: &'a Country,
        product: &'a str,
    ) -> Self {
        Self {
            analyzer,
            settings,
            country,
            product,
        }
    }

    /// Analyzes `candidates` in (tier, source rank) order with at most
    /// `concurrency` tasks in flight, until all finish or `deadline` passes.
    ///
    /// At the deadline the in-flight tasks are dropped at their current
    /// await point and unstarted tasks never run; only outcomes completed
    /// before then are reported.
    pub async fn run(
        &self,
        mut candidates: Vec<CandidateUrl>,
        deadline: Instant,
    ) -> CoordinatorReport {
        candidates.sort_by_key(CandidateUrl::priority);
        let total = candidates.len();
        let collector = ResultsCollector::default();

        let this = self;
        let sink = collector.clone();
        let drain = stream::iter(candidates)
            .map(move |candidate| {
                let sink = sink.clone();
                async move {
                    sink.push(this.run_task(candidate).await);
                }
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .for_each(|()| async {});

        let deadline_hit = tokio::time::timeout_at(deadline, drain).await.is_err();

        let outcomes = collector.drain();
        let cancelled = total - outcomes.len();
        if deadline_hit {
            tracing::warn!(
                completed = outcomes.len(),
                cancelled,
                "extraction deadline reached; keeping completed results"
            );
        }

        CoordinatorReport {
            outcomes,
            cancelled,
            deadline_hit,
        }
    }

    async fn run_task(&self, candidate: CandidateUrl) -> TaskOutcome {
        let mut task = ExtractionTask::new(candidate);

        loop {
            task.transition(TaskState::InFlight);
            let url = fetch_url(&task.candidate.raw_url)
                .unwrap_or_else(|| task.candidate.canonical_url.clone());

            let result = analyze_with_timeout(
                self.analyzer,
                &url,
                self.country,
                self.product,
                self.settings.task_timeout,
            )
            .await;

            match result {
                Ok(PageAnalysis::Offer(offer)) => {
                    return match build_record(offer, &task.candidate, None) {
                        Ok(record) => {
                            task.transition(TaskState::Succeeded);
                            tracing::info!(
                                url = %url,
                                store = %record.store_domain,
                                price = %record.price,
                                currency = %record.currency,
                                "extracted offer"
                            );
                            task.into_outcome(Some(record), None)
                        }
                        Err(e) => {
                            tracing::warn!(url = %url, error = %e, "rejected extracted offer");
                            task.fail_attempt(&e);
                            task.transition(TaskState::Failed);
                            task.into_outcome(None, None)
                        }
                    };
                }
                Ok(PageAnalysis::Aggregator(resolution)) => {
                    task.transition(TaskState::AggregatorDetected);
                    let ChildResolution { child, result } = resolve_aggregator(
                        self.analyzer,
                        &task.candidate,
                        &resolution,
                        self.country,
                        self.product,
                        self.settings.task_timeout,
                    )
                    .await;
                    return match result {
                        Ok(record) => {
                            task.transition(TaskState::Succeeded);
                            tracing::info!(
                                url = %url,
                                store = %record.store_domain,
                                price = %record.price,
                                "extracted offer via aggregator"
                            );
                            task.into_outcome(Some(record), Some(resolution.aggregator_url))
                                .with_child(child)
                        }
                        Err(e) => {
                            tracing::warn!(url = %url, error = %e, "aggregator resolution failed");
                            task.fail_resolution(&e);
                            task.into_outcome(None, Some(resolution.aggregator_url))
                                .with_child(child)
                        }
                    };
                }
                Err(e) => {
                    task.fail_attempt(&e);
                    let retries_used = task.attempts() - 1;
                    if e.is_transient() && retries_used < self.settings.max_retries {
                        let delay = backoff_delay(self.settings.retry_backoff_ms, task.attempts());
                        tracing::warn!(
                            url = %url,
                            attempt = task.attempts(),
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %e,
                            "transient extraction failure, retrying"
                        );
                        task.transition(TaskState::Pending);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        url = %url,
                        attempts = task.attempts(),
                        error = %e,
                        "extraction failed"
                    );
                    task.transition(TaskState::Failed);
                    return task.into_outcome(None, None);
                }
            }
        }
    }
}

/// One analysis call bounded by `timeout`.
pub(crate) async fn analyze_with_timeout<A>(
    analyzer: &A,
    url: &str,
    country: &Country,
    product: &str,
    timeout: Duration,
) -> Result<PageAnalysis, ExtractionError>
where
    A: PageAnalyzer + ?Sized,
{
    match tokio::time::timeout(timeout, analyzer.analyze(url, country, product)).await {
        Ok(result) => result,
        Err(_) => Err(ExtractionError::Timeout {
            url: url.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Validates an extracted offer and stamps it with the candidate's tier.
///
/// The store domain comes from the page the offer was read from, falling
/// back to the candidate's domain. The store name is the page's seller
/// name, then `store_hint`, then the display form of the domain.
pub(crate) fn build_record(
    offer: ExtractedOffer,
    candidate: &CandidateUrl,
    store_hint: Option<&str>,
) -> Result<PriceRecord, ExtractionError> {
    if offer.price < Decimal::ZERO {
        return Err(ExtractionError::Parse {
            url: candidate.canonical_url.clone(),
            reason: format!("negative price {}", offer.price),
        });
    }

    let currency = offer.currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ExtractionError::Parse {
            url: candidate.canonical_url.clone(),
            reason: format!("invalid currency code {:?}", offer.currency),
        });
    }

    let store_domain = url_domain(&offer.final_url).unwrap_or_else(|| candidate.domain.clone());
    let store_name = offer
        .store_name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            store_hint
                .filter(|h| !h.trim().is_empty())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| store_display_name(&store_domain));
    let source_url = if offer.final_url.is_empty() {
        candidate.canonical_url.clone()
    } else {
        offer.final_url
    };

    Ok(PriceRecord {
        price: offer.price,
        currency,
        store_name,
        store_domain,
        availability: offer.availability,
        source_url,
        tier: candidate.tier,
    })
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
