//! Page analysis seam: turns one store page URL into an offer, an
//! aggregator pointer, or a failure.

mod html;
mod jsonld;
mod page;
mod text;

pub use html::HtmlPageAnalyzer;
pub use page::parse_page;

use async_trait::async_trait;
use buyspy_core::{AggregatorResolution, Availability, Country};
use rust_decimal::Decimal;

use crate::error::ExtractionError;

/// Offer data read from a direct store page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedOffer {
    pub price: Decimal,
    /// ISO 4217 code as found on the page; validated by the coordinator.
    pub currency: String,
    /// Seller name from the page, if it states one.
    pub store_name: Option<String>,
    pub availability: Availability,
    /// URL of the page the offer was read from, after redirects.
    pub final_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAnalysis {
    Offer(ExtractedOffer),
    Aggregator(AggregatorResolution),
}

#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    /// Analyzes `url` as a potential store page for `product` in `country`.
    async fn analyze(
        &self,
        url: &str,
        country: &Country,
        product: &str,
    ) -> Result<PageAnalysis, ExtractionError>;
}

#[async_trait]
impl<T: PageAnalyzer + ?Sized> PageAnalyzer for std::sync::Arc<T> {
    async fn analyze(
        &self,
        url: &str,
        country: &Country,
        product: &str,
    ) -> Result<PageAnalysis, ExtractionError> {
        (**self).analyze(url, country, product).await
    }
}
