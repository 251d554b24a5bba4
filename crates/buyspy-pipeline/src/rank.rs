//! Per-store deduplication and final ordering of price records.

use std::collections::HashMap;

use buyspy_core::{Country, PriceRecord, RankedResult, Tier};
use chrono::Utc;
use rust_decimal::Decimal;

/// Keeps one record per store domain and orders the survivors.
///
/// Within a domain the cheapest record wins, then the better availability,
/// then the better tier, then the lexicographically smaller source URL.
/// Survivors sort by price, tier, availability preference, and store domain,
/// so the output is fully determined by the input set.
#[must_use]
pub fn rank_offers(records: Vec<PriceRecord>) -> Vec<PriceRecord> {
    let mut best: HashMap<String, PriceRecord> = HashMap::new();

    for record in records {
        let replace = best
            .get(&record.store_domain)
            .map_or(true, |current| dedupe_key(&record) < dedupe_key(current));
        if replace {
            best.insert(record.store_domain.clone(), record);
        }
    }

    let mut ranked: Vec<PriceRecord> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        a.price
            .cmp(&b.price)
            .then(a.tier.cmp(&b.tier))
            .then(
                a.availability
                    .preference_rank()
                    .cmp(&b.availability.preference_rank()),
            )
            .then_with(|| a.store_domain.cmp(&b.store_domain))
    });
    ranked
}

fn dedupe_key(r: &PriceRecord) -> (Decimal, u8, Tier, &str) {
    (
        r.price,
        r.availability.preference_rank(),
        r.tier,
        r.source_url.as_str(),
    )
}

/// Wraps ranked records into a [`RankedResult`]. `total_found` counts the
/// records before deduplication.
#[must_use]
pub fn build_ranked_result(
    product: &str,
    country: Country,
    records: Vec<PriceRecord>,
) -> RankedResult {
    let total_found = records.len();
    let records = rank_offers(records);
    tracing::info!(
        product,
        country = %country,
        total_found,
        stores = records.len(),
        "ranked offers"
    );
    RankedResult {
        product: product.to_string(),
        country,
        records,
        total_found,
        discovered_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use buyspy_core::Availability;

    use super::*;

    fn record(domain: &str, price: &str, tier: Tier, availability: Availability) -> PriceRecord {
        PriceRecord {
            price: Decimal::from_str(price).unwrap(),
            currency: "EUR".to_string(),
            store_name: domain.to_string(),
            store_domain: domain.to_string(),
            availability,
            source_url: format!("https://{domain}/p"),
            tier,
        }
    }

    fn prices(records: &[PriceRecord]) -> Vec<String> {
        records.iter().map(|r| r.price.to_string()).collect()
    }

    #[test]
    fn sorts_by_price_ascending() {
        let ranked = rank_offers(vec![
            record("a.fi", "49.99", Tier::Tier1, Availability::InStock),
            record("b.fi", "52.90", Tier::Tier1, Availability::InStock),
            record("c.fi", "45.00", Tier::Tier1, Availability::InStock),
        ]);
        assert_eq!(prices(&ranked), vec!["45.00", "49.99", "52.90"]);
    }

    #[test]
    fn keeps_cheapest_record_per_domain() {
        let ranked = rank_offers(vec![
            record("a.fi", "60.00", Tier::Tier1, Availability::InStock),
            record("a.fi", "55.00", Tier::Tier1, Availability::OutOfStock),
            record("b.fi", "58.00", Tier::Tier2, Availability::InStock),
        ]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].store_domain, "a.fi");
        assert_eq!(ranked[0].price, Decimal::from_str("55.00").unwrap());
    }

    #[test]
    fn equal_price_prefers_better_availability_within_domain() {
        let ranked = rank_offers(vec![
            record("a.fi", "55.00", Tier::Tier1, Availability::Unknown),
            record("a.fi", "55.00", Tier::Tier1, Availability::Limited),
            record("a.fi", "55.00", Tier::Tier1, Availability::OutOfStock),
        ]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].availability, Availability::Limited);
    }

    #[test]
    fn price_beats_tier_and_tier_beats_availability() {
        let ranked = rank_offers(vec![
            record("tier1.fi", "80.00", Tier::Tier1, Availability::InStock),
            record("tier3.com", "70.00", Tier::Tier3, Availability::InStock),
            record("tier2.de", "80.00", Tier::Tier2, Availability::InStock),
            record("unknown.example", "80.00", Tier::Tier1, Availability::OutOfStock),
        ]);
        let domains: Vec<&str> = ranked.iter().map(|r| r.store_domain.as_str()).collect();
        assert_eq!(
            domains,
            vec!["tier3.com", "tier1.fi", "unknown.example", "tier2.de"]
        );
    }

    #[test]
    fn full_ties_break_on_domain() {
        let ranked = rank_offers(vec![
            record("b.fi", "10", Tier::Tier1, Availability::InStock),
            record("a.fi", "10", Tier::Tier1, Availability::InStock),
        ]);
        assert_eq!(ranked[0].store_domain, "a.fi");
    }

    #[test]
    fn ranking_is_order_independent() {
        let input = vec![
            record("a.fi", "30", Tier::Tier1, Availability::InStock),
            record("b.fi", "20", Tier::Tier3, Availability::Unknown),
            record("a.fi", "25", Tier::Tier1, Availability::Limited),
            record("c.fi", "20", Tier::Tier2, Availability::InStock),
        ];
        let mut reversed = input.clone();
        reversed.reverse();
        assert_eq!(rank_offers(input), rank_offers(reversed));
    }

    #[test]
    fn result_counts_records_before_dedupe() {
        let country = Country::parse("FI").unwrap();
        let result = build_ranked_result(
            "Sony WF-C510",
            country,
            vec![
                record("a.fi", "30", Tier::Tier1, Availability::InStock),
                record("a.fi", "25", Tier::Tier1, Availability::InStock),
            ],
        );
        assert_eq!(result.total_found, 2);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let result = build_ranked_result("x", Country::parse("FI").unwrap(), Vec::new());
        assert!(result.is_empty());
        assert_eq!(result.total_found, 0);
    }
}
