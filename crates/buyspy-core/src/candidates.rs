use serde::{Deserialize, Serialize};

use crate::country::Country;
use crate::offers::Tier;

/// A search request for one product in one country. Immutable once built;
/// construct through the pipeline's query formulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    product: String,
    country: Country,
    /// Search-engine region code, e.g. `"fi-fi"`.
    region: String,
    /// The text actually sent to the search capability.
    query: String,
}

impl SearchQuery {
    #[must_use]
    pub fn new(product: String, country: Country, region: String, query: String) -> Self {
        Self {
            product,
            country,
            region,
            query,
        }
    }

    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    #[must_use]
    pub fn country(&self) -> &Country {
        &self.country
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// A deduplicated candidate store page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUrl {
    /// URL exactly as the search capability returned it.
    pub raw_url: String,
    /// Normalized form used as the deduplication key.
    pub canonical_url: String,
    /// Registrable domain, e.g. `"verkkokauppa.com"`.
    pub domain: String,
    pub tier: Tier,
    /// 0-based position in the search results; only used as a tie-break.
    pub source_rank: usize,
}

impl CandidateUrl {
    /// Returns the candidate annotated with `tier`.
    #[must_use]
    pub fn with_tier(self, tier: Tier) -> Self {
        Self { tier, ..self }
    }

    /// Scheduling priority: tier first, then search rank.
    #[must_use]
    pub fn priority(&self) -> (Tier, usize) {
        (self.tier, self.source_rank)
    }
}
