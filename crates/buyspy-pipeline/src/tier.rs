//! Assigns a priority tier to each candidate store domain for a target
//! country.

use std::collections::{HashMap, HashSet};

use buyspy_core::{
    normalize_domain, CandidateUrl, Country, RetailerEntry, RetailerKind, RetailersFile, Tier,
};

use crate::normalize::{domain_label, top_level_label};

/// Deterministic `(domain, country) → Tier` classifier backed by a retailer
/// directory.
///
/// | Directory entry | Serves target country | Tier |
/// |-----------------|-----------------------|------|
/// | regional / aggregator | yes | `Tier1` |
/// | international (any ccTLD of the brand) | — | `Tier2` |
/// | regional / aggregator | no | `Tier3` |
/// | commerce | — | `Tier3` |
/// | not listed | — | `Unknown` |
#[derive(Debug, Clone)]
pub struct TierClassifier {
    by_domain: HashMap<String, RetailerEntry>,
    international_labels: HashSet<String>,
}

impl TierClassifier {
    /// Entries are keyed by their normalized domain, so `" www.Jimms.fi"`
    /// matches `jimms.fi`.
    #[must_use]
    pub fn new(directory: RetailersFile) -> Self {
        let entries: Vec<RetailerEntry> = directory
            .retailers
            .into_iter()
            .map(|mut e| {
                e.domain = normalize_domain(&e.domain);
                e
            })
            .collect();
        let international_labels = entries
            .iter()
            .filter(|e| e.kind == RetailerKind::International)
            .map(|e| domain_label(&e.domain).to_string())
            .collect();
        let by_domain = entries
            .into_iter()
            .map(|e| (e.domain.clone(), e))
            .collect();
        Self {
            by_domain,
            international_labels,
        }
    }

    /// Classifier over the built-in retailer directory.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(RetailersFile::builtin())
    }

    #[must_use]
    pub fn classify(&self, domain: &str, country: &Country) -> Tier {
        if let Some(entry) = self.by_domain.get(domain) {
            return match entry.kind {
                RetailerKind::Regional | RetailerKind::Aggregator => {
                    if serves_country(entry, country) {
                        Tier::Tier1
                    } else {
                        Tier::Tier3
                    }
                }
                RetailerKind::International => Tier::Tier2,
                RetailerKind::Commerce => Tier::Tier3,
            };
        }

        if self.international_labels.contains(domain_label(domain)) {
            return Tier::Tier2;
        }

        Tier::Unknown
    }

    /// Returns `candidates` annotated with their tiers, in the same order.
    #[must_use]
    pub fn annotate(&self, candidates: Vec<CandidateUrl>, country: &Country) -> Vec<CandidateUrl> {
        candidates
            .into_iter()
            .map(|c| {
                let tier = self.classify(&c.domain, country);
                tracing::debug!(domain = %c.domain, %tier, "classified candidate");
                c.with_tier(tier)
            })
            .collect()
    }

    #[must_use]
    pub fn is_aggregator(&self, domain: &str) -> bool {
        self.by_domain
            .get(domain)
            .is_some_and(|e| e.kind == RetailerKind::Aggregator)
    }

    /// All listed comparison-site domains.
    #[must_use]
    pub fn aggregator_domains(&self) -> HashSet<String> {
        self.by_domain
            .values()
            .filter(|e| e.kind == RetailerKind::Aggregator)
            .map(|e| e.domain.clone())
            .collect()
    }
}

/// An entry serves the countries it lists; with no list, the country is
/// inferred from the ccTLD (`power.fi` → FI, `currys.co.uk` → GB).
fn serves_country(entry: &RetailerEntry, country: &Country) -> bool {
    if entry.countries.is_empty() {
        Country::from_cc_tld(top_level_label(&entry.domain)).as_ref() == Some(country)
    } else {
        entry.countries.contains(country)
    }
}
