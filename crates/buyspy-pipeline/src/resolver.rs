//! Follows a comparison page to the store it lists, exactly once.

use std::time::Duration;

use buyspy_core::{AggregatorResolution, CandidateUrl, Country, PriceRecord};

use crate::analyze::{PageAnalysis, PageAnalyzer};
use crate::coordinator::{analyze_with_timeout, build_record};
use crate::error::ExtractionError;
use crate::normalize::{canonicalize_url, url_domain};
use crate::task::{ExtractionTask, TaskOutcome, TaskState};

/// Turns a resolution into the child candidate to analyze.
///
/// The resolved URL must be an absolute http(s) URL whose canonical form
/// differs from the aggregator page's. The child inherits the parent's tier
/// and source rank.
///
/// # Errors
///
/// Returns [`ExtractionError::AggregatorResolution`] if the URL is invalid or
/// points back at the aggregator page.
pub fn validate_resolution(
    parent: &CandidateUrl,
    resolution: &AggregatorResolution,
) -> Result<CandidateUrl, ExtractionError> {
    let reject = |reason: &str| ExtractionError::AggregatorResolution {
        url: parent.canonical_url.clone(),
        reason: reason.to_string(),
    };

    let canonical_url = canonicalize_url(&resolution.resolved_url)
        .ok_or_else(|| reject("resolved URL is not an absolute http(s) URL"))?;

    let aggregator_canonical = canonicalize_url(&resolution.aggregator_url);
    if canonical_url == parent.canonical_url
        || aggregator_canonical.as_deref() == Some(canonical_url.as_str())
    {
        return Err(reject("resolved URL points back at the aggregator page"));
    }

    let domain = url_domain(&canonical_url).ok_or_else(|| reject("resolved URL has no host"))?;

    Ok(CandidateUrl {
        raw_url: resolution.resolved_url.trim().to_string(),
        canonical_url,
        domain,
        tier: parent.tier,
        source_rank: parent.source_rank,
    })
}

/// What following an aggregator link produced.
#[derive(Debug)]
pub struct ChildResolution {
    /// The store page's own task. `None` when the link was rejected before
    /// anything was fetched.
    pub child: Option<TaskOutcome>,
    pub result: Result<PriceRecord, ExtractionError>,
}

/// Validates `resolution`, then runs the store page as a child task that is
/// analyzed once under `timeout`.
///
/// The child is fetched by its raw URL: comparison sites' outbound links
/// often need their query string to redirect. A child that is itself a
/// comparison page is not followed further and fails with
/// [`ExtractionError::AggregatorResolution`].
pub async fn resolve_aggregator<A>(
    analyzer: &A,
    parent: &CandidateUrl,
    resolution: &AggregatorResolution,
    country: &Country,
    product: &str,
    timeout: Duration,
) -> ChildResolution
where
    A: PageAnalyzer + ?Sized,
{
    let child = match validate_resolution(parent, resolution) {
        Ok(child) => child,
        Err(e) => {
            return ChildResolution {
                child: None,
                result: Err(e),
            }
        }
    };
    tracing::info!(
        aggregator = %parent.canonical_url,
        resolved = %child.canonical_url,
        store_hint = resolution.store_hint.as_deref().unwrap_or(""),
        "following aggregator to store page"
    );

    let mut task = ExtractionTask::new(child);
    task.transition(TaskState::InFlight);
    let analysis =
        analyze_with_timeout(analyzer, &task.candidate.raw_url, country, product, timeout).await;

    let result = match analysis {
        Ok(PageAnalysis::Offer(offer)) => {
            match build_record(offer, &task.candidate, resolution.store_hint.as_deref()) {
                Ok(record) => {
                    task.transition(TaskState::Succeeded);
                    Ok(record)
                }
                Err(e) => {
                    task.fail_attempt(&e);
                    task.transition(TaskState::Failed);
                    Err(e)
                }
            }
        }
        Ok(PageAnalysis::Aggregator(nested)) => {
            let e = ExtractionError::AggregatorResolution {
                url: task.candidate.canonical_url.clone(),
                reason: format!(
                    "resolved page is another aggregator (points to {})",
                    nested.resolved_url
                ),
            };
            task.transition(TaskState::AggregatorDetected);
            task.fail_resolution(&e);
            Err(e)
        }
        Err(e) => {
            task.fail_attempt(&e);
            task.transition(TaskState::Failed);
            Err(e)
        }
    };

    let record = result.as_ref().ok().cloned();
    ChildResolution {
        child: Some(task.into_outcome(record, None)),
        result,
    }
}

#[cfg(test)]
mod tests {
    use buyspy_core::Tier;

    use super::*;
    use crate::normalize::normalize_candidates;

    fn parent() -> CandidateUrl {
        normalize_candidates(["https://hinta.fi/2162671/philips-tah9505"], 2)
            .into_iter()
            .next()
            .unwrap()
            .with_tier(Tier::Tier1)
    }

    fn resolution(resolved: &str) -> AggregatorResolution {
        AggregatorResolution {
            aggregator_url: "https://hinta.fi/2162671/philips-tah9505".to_string(),
            resolved_url: resolved.to_string(),
            store_hint: None,
        }
    }

    #[test]
    fn child_inherits_parent_tier_and_rank() {
        let child = validate_resolution(
            &parent(),
            &resolution("https://www.verkkokauppa.com/fi/product/123?utm_source=hinta"),
        )
        .unwrap();
        assert_eq!(child.domain, "verkkokauppa.com");
        assert_eq!(
            child.canonical_url,
            "https://verkkokauppa.com/fi/product/123"
        );
        assert_eq!(
            child.raw_url,
            "https://www.verkkokauppa.com/fi/product/123?utm_source=hinta"
        );
        assert_eq!(child.tier, Tier::Tier1);
        assert_eq!(child.source_rank, 0);
    }

    #[test]
    fn rejects_self_reference() {
        let err = validate_resolution(
            &parent(),
            &resolution("https://www.hinta.fi/2162671/philips-tah9505#offers"),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::AggregatorResolution { .. }));
    }

    #[test]
    fn rejects_non_http_urls() {
        for bad in ["", "/go/1", "javascript:void(0)", "mailto:shop@example.com"] {
            let err = validate_resolution(&parent(), &resolution(bad)).unwrap_err();
            assert!(
                matches!(err, ExtractionError::AggregatorResolution { .. }),
                "{bad}"
            );
        }
    }
}
