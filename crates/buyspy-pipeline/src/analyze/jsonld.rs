//! JSON-LD `Offer` / `AggregateOffer` extraction.

use std::str::FromStr;
use std::sync::LazyLock;

use buyspy_core::Availability;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::text::{availability_from_schema, parse_amount};

static JSON_LD_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld script regex")
});

/// One offer node found in the page's structured data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct JsonLdOffer {
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub availability: Option<Availability>,
    pub url: Option<String>,
    pub seller: Option<String>,
    /// `AggregateOffer` nodes summarize several sellers.
    pub is_aggregate: bool,
}

/// Collects every offer node from every JSON-LD block, including `@graph`
/// members and offers nested in products or aggregate offers.
pub(super) fn extract_offers(html: &str) -> Vec<JsonLdOffer> {
    let mut offers = Vec::new();
    for cap in JSON_LD_SCRIPT_RE.captures_iter(html) {
        let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
        if raw.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            tracing::debug!("skipping malformed json-ld block");
            continue;
        };
        collect_offers(&value, &mut offers);
    }
    offers
}

fn collect_offers(value: &Value, out: &mut Vec<JsonLdOffer>) {
    match value {
        Value::Object(map) => {
            if let Some(kind) = offer_kind(map.get("@type")) {
                out.push(offer_from_node(map, kind == OfferKind::Aggregate));
            }
            for child in map.values() {
                collect_offers(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_offers(item, out);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfferKind {
    Single,
    Aggregate,
}

fn offer_kind(type_value: Option<&Value>) -> Option<OfferKind> {
    let matches = |t: &str| match t {
        "AggregateOffer" => Some(OfferKind::Aggregate),
        "Offer" => Some(OfferKind::Single),
        _ => None,
    };
    match type_value? {
        Value::String(t) => matches(t),
        Value::Array(items) => items.iter().filter_map(Value::as_str).find_map(matches),
        _ => None,
    }
}

fn offer_from_node(map: &Map<String, Value>, is_aggregate: bool) -> JsonLdOffer {
    let price = if is_aggregate {
        map.get("lowPrice")
            .or_else(|| map.get("price"))
            .and_then(decimal_value)
    } else {
        map.get("price")
            .or_else(|| {
                map.get("priceSpecification")
                    .and_then(|spec| spec.get("price"))
            })
            .and_then(decimal_value)
    };

    let currency = map
        .get("priceCurrency")
        .or_else(|| {
            map.get("priceSpecification")
                .and_then(|spec| spec.get("priceCurrency"))
        })
        .and_then(Value::as_str)
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty());

    let availability = map
        .get("availability")
        .and_then(Value::as_str)
        .and_then(availability_from_schema);

    let url = map
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(ToString::to_string);

    let seller = match map.get("seller") {
        Some(Value::Object(seller)) => seller.get("name").and_then(Value::as_str),
        Some(Value::String(name)) => Some(name.as_str()),
        _ => None,
    }
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(ToString::to_string);

    JsonLdOffer {
        price,
        currency,
        availability,
        url,
        seller,
        is_aggregate,
    }
}

fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        // Structured data uses plain decimal notation; the localized
        // parser only covers strings that are not.
        Value::String(s) => Decimal::from_str(s.trim()).ok().or_else(|| parse_amount(s)),
        _ => None,
    }
}
