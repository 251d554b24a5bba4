//! HTTP-backed [`PageAnalyzer`].

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use buyspy_core::Country;
use reqwest::{Client, StatusCode};

use super::{parse_page, PageAnalysis, PageAnalyzer};
use crate::error::ExtractionError;
use crate::normalize::url_domain;

/// Largest page body read before the page is given up on.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Fetches pages with a GET that follows redirects, then parses them.
///
/// The analyzed URL is the one the fetch lands on, so aggregator redirect
/// links (`/go/123`) resolve to the real store page.
pub struct HtmlPageAnalyzer {
    client: Client,
    timeout_ms: u64,
    max_body_bytes: usize,
    aggregator_domains: HashSet<String>,
}

impl HtmlPageAnalyzer {
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        aggregator_domains: HashSet<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            timeout_ms: timeout_secs.saturating_mul(1000),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            aggregator_domains,
        })
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    fn too_large(&self, url: &str) -> ExtractionError {
        ExtractionError::NotCommerce {
            url: url.to_string(),
            reason: format!("page larger than {} bytes", self.max_body_bytes),
        }
    }

    fn map_request_error(&self, url: &str, err: &reqwest::Error) -> ExtractionError {
        if err.is_timeout() {
            ExtractionError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            ExtractionError::Network {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageAnalyzer for HtmlPageAnalyzer {
    async fn analyze(
        &self,
        url: &str,
        country: &Country,
        product: &str,
    ) -> Result<PageAnalysis, ExtractionError> {
        let mut response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| self.map_request_error(url, &e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(ExtractionError::Network {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(ExtractionError::NotCommerce {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(ExtractionError::NotCommerce {
                url: url.to_string(),
                reason: format!("non-HTML content type {content_type}"),
            });
        }

        let final_url = response.url().to_string();
        if final_url != url {
            tracing::debug!(url, final_url = %final_url, "followed redirect");
        }

        let declared = response
            .content_length()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        if declared > self.max_body_bytes {
            return Err(self.too_large(url));
        }

        let mut body = Vec::with_capacity(declared);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_request_error(url, &e))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }
        let html = decode_body(&body, &content_type);

        // Judged on the landing page: an aggregator's outbound link that
        // redirects to a store is a store page.
        let is_aggregator_domain =
            url_domain(&final_url).is_some_and(|d| self.aggregator_domains.contains(&d));

        parse_page(url, &final_url, &html, product, country, is_aggregator_domain)
    }
}

/// Decodes a page body by its declared charset. Single-byte Western pages
/// are read as Windows-1252 for the euro sign; anything else as UTF-8.
fn decode_body(body: &[u8], content_type: &str) -> String {
    let single_byte = ["iso-8859-1", "iso-8859-15", "latin1", "windows-1252"]
        .iter()
        .any(|cs| content_type.contains(&format!("charset={cs}")));
    if single_byte {
        body.iter()
            .map(|&b| if b == 0x80 { '€' } else { char::from(b) })
            .collect()
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}
