//! Search capability seam and the search collector.

mod serper;

pub use serper::SerperSearchClient;

use async_trait::async_trait;
use buyspy_core::SearchQuery;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, SearchError};
use crate::retry::retry_with_backoff;

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

/// A web search backend, geographically biased by the query's country.
#[async_trait]
pub trait SearchCapability: Send + Sync {
    /// Returns at most `max_results` hits in rank order.
    async fn search(
        &self,
        query: &SearchQuery,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

#[async_trait]
impl<T: SearchCapability + ?Sized> SearchCapability for std::sync::Arc<T> {
    async fn search(
        &self,
        query: &SearchQuery,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        (**self).search(query, max_results).await
    }
}

/// Calls the search capability once, retrying a single time after
/// `retry_backoff_ms` if the call errors or yields no hits.
///
/// A backend that succeeds twice with zero hits is not an error: the empty
/// list is returned and the caller reports "no results".
///
/// # Errors
///
/// Returns [`PipelineError::SearchUnavailable`] if the retry also errors.
pub async fn collect_search_results<S>(
    search: &S,
    query: &SearchQuery,
    max_results: usize,
    retry_backoff_ms: u64,
) -> Result<Vec<SearchHit>, PipelineError>
where
    S: SearchCapability + ?Sized,
{
    let result = retry_with_backoff(
        1,
        retry_backoff_ms,
        |r: &Result<Vec<SearchHit>, SearchError>| r.as_ref().map_or(true, Vec::is_empty),
        || search.search(query, max_results),
    )
    .await;

    match result {
        Ok(mut hits) => {
            hits.truncate(max_results);
            tracing::info!(
                query = query.query(),
                region = query.region(),
                count = hits.len(),
                "search collected candidate URLs"
            );
            Ok(hits)
        }
        Err(source) => {
            tracing::warn!(query = query.query(), error = %source, "search unavailable");
            Err(PipelineError::SearchUnavailable {
                query: query.query().to_string(),
                source,
            })
        }
    }
}
