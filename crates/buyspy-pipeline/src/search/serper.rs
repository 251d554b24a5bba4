//! HTTP client for a Serper-compatible web search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use buyspy_core::SearchQuery;
use reqwest::Client;
use serde::Deserialize;

use super::{SearchCapability, SearchHit};
use crate::error::SearchError;

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Web search over `POST {base_url}/search`.
///
/// The request carries the query text, the country as `gl`, and the result
/// count as `num`. 429 responses map to [`SearchError::RateLimited`]; other
/// non-2xx statuses to [`SearchError::UnexpectedStatus`].
pub struct SerperSearchClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerperSearchClient {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchCapability for SerperSearchClient {
    async fn search(
        &self,
        query: &SearchQuery,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let body = serde_json::json!({
            "q": query.query(),
            "gl": query.country().code().to_ascii_lowercase(),
            "num": max_results,
        });

        tracing::debug!(query = query.query(), max_results, "search request");

        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(SearchError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(SearchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        let parsed =
            serde_json::from_str::<SerperResponse>(&text).map_err(|e| SearchError::Deserialize {
                context: format!("search results for \"{}\"", query.query()),
                source: e,
            })?;

        let hits: Vec<SearchHit> = parsed
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .take(max_results)
            .map(|r| SearchHit {
                url: r.link,
                title: r.title,
                snippet: r.snippet,
            })
            .collect();

        Ok(hits)
    }
}
