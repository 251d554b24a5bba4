use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::country::Country;

/// Priority class of a candidate store domain for a target country.
///
/// Ordering is significant: `Tier1 < Tier2 < Tier3 < Unknown`, so sorting
/// ascending puts the most trusted stores first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
    Unknown,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Tier1 => write!(f, "tier1"),
            Tier::Tier2 => write!(f, "tier2"),
            Tier::Tier3 => write!(f, "tier3"),
            Tier::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    Limited,
    OutOfStock,
    Unknown,
}

impl Availability {
    /// Lower is better: in stock, then limited, then unknown, then out of stock.
    #[must_use]
    pub fn preference_rank(self) -> u8 {
        match self {
            Availability::InStock => 0,
            Availability::Limited => 1,
            Availability::Unknown => 2,
            Availability::OutOfStock => 3,
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::InStock => write!(f, "in_stock"),
            Availability::Limited => write!(f, "limited"),
            Availability::OutOfStock => write!(f, "out_of_stock"),
            Availability::Unknown => write!(f, "unknown"),
        }
    }
}

/// A verified store offer, produced only by a successful extraction task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Non-negative offer price.
    pub price: Decimal,
    /// ISO 4217 currency code, e.g. `"EUR"`.
    pub currency: String,
    /// Human-facing store name, e.g. `"Verkkokauppa.com"`.
    pub store_name: String,
    /// Registrable domain of the store that sells the product.
    pub store_domain: String,
    pub availability: Availability,
    /// The page the price was read from, after any aggregator resolution.
    pub source_url: String,
    pub tier: Tier,
}

/// A comparison page's pointer to the store it lists as the best offer.
///
/// Transient: consumed by the aggregator resolver to spawn at most one
/// follow-up extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorResolution {
    pub aggregator_url: String,
    pub resolved_url: String,
    /// Store name as listed on the comparison page, if any.
    pub store_hint: Option<String>,
}

/// Final, ordered pipeline output: at most one record per store domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub product: String,
    pub country: Country,
    pub records: Vec<PriceRecord>,
    /// Successful extractions before per-store deduplication.
    pub total_found: usize,
    pub discovered_at: DateTime<Utc>,
}

impl RankedResult {
    #[must_use]
    pub fn empty(product: &str, country: Country) -> Self {
        Self {
            product: product.to_string(),
            country,
            records: Vec::new(),
            total_found: 0,
            discovered_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// The best offer, if any.
    #[must_use]
    pub fn cheapest(&self) -> Option<&PriceRecord> {
        self.records.first()
    }
}
