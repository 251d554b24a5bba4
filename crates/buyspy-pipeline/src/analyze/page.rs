//! Pure page parsing: HTML in, [`PageAnalysis`] out.

use std::collections::HashSet;

use buyspy_core::{AggregatorResolution, Availability, Country};
use reqwest::Url;
use rust_decimal::Decimal;

use super::jsonld::{extract_offers, JsonLdOffer};
use super::text::{
    availability_from_text, find_price_in_text, meta_price, product_matches, visible_text,
};
use super::{ExtractedOffer, PageAnalysis};
use crate::error::ExtractionError;
use crate::normalize::url_domain;

const EURO_MARKETS: &[&str] = &[
    "AT", "BE", "CY", "DE", "EE", "ES", "FI", "FR", "GR", "HR", "IE", "IT", "LT", "LU", "LV",
    "MT", "NL", "PT", "SI", "SK",
];

/// Currency assumed when a page states a price but no currency.
fn market_currency(country: &Country) -> Option<&'static str> {
    match country.code() {
        "US" => Some("USD"),
        "GB" => Some("GBP"),
        "SE" => Some("SEK"),
        "NO" => Some("NOK"),
        "DK" => Some("DKK"),
        code if EURO_MARKETS.contains(&code) => Some("EUR"),
        _ => None,
    }
}

/// Parses a fetched page.
///
/// `final_url` is where the fetch landed after redirects; relative offer
/// links resolve against it. `is_aggregator_domain` marks pages from a
/// listed comparison site.
///
/// # Errors
///
/// - [`ExtractionError::NotCommerce`] if the page does not mention the
///   product's model numbers.
/// - [`ExtractionError::AggregatorResolution`] if a comparison page lists no
///   usable store offer.
/// - [`ExtractionError::Parse`] if a store page has no readable price.
pub fn parse_page(
    requested_url: &str,
    final_url: &str,
    html: &str,
    product: &str,
    country: &Country,
    is_aggregator_domain: bool,
) -> Result<PageAnalysis, ExtractionError> {
    let text = visible_text(html);
    if !product_matches(&text, product) {
        return Err(ExtractionError::NotCommerce {
            url: requested_url.to_string(),
            reason: "wrong product".to_string(),
        });
    }

    let offers = extract_offers(html);

    if is_aggregator_domain || looks_like_comparison(&offers, final_url) {
        // Unlisted pages only hand off to another site; their own links are
        // variants of the same product.
        match best_store_offer(&offers, final_url, !is_aggregator_domain) {
            Some((resolved_url, store_hint)) => {
                return Ok(PageAnalysis::Aggregator(AggregatorResolution {
                    aggregator_url: final_url.to_string(),
                    resolved_url,
                    store_hint,
                }));
            }
            None if is_aggregator_domain => {
                return Err(ExtractionError::AggregatorResolution {
                    url: requested_url.to_string(),
                    reason: "no in-stock store offer with a link".to_string(),
                });
            }
            // Several sellers but no way off the page: a marketplace
            // listing, read as a direct offer below.
            None => {}
        }
    }

    direct_offer(requested_url, final_url, html, &text, &offers, country).map(PageAnalysis::Offer)
}

/// An unlisted page compares stores when it names at least two sellers or
/// links an offer to another site. An `AggregateOffer` alone is just a
/// store's variant range.
fn looks_like_comparison(offers: &[JsonLdOffer], final_url: &str) -> bool {
    let sellers: HashSet<String> = offers
        .iter()
        .filter_map(|o| o.seller.as_deref())
        .map(str::to_lowercase)
        .collect();
    if sellers.len() >= 2 {
        return true;
    }
    let Ok(base) = Url::parse(final_url) else {
        return false;
    };
    offers
        .iter()
        .filter_map(|o| base.join(o.url.as_deref()?).ok())
        .any(|url| is_off_site(&url, &base))
}

fn is_off_site(url: &Url, base: &Url) -> bool {
    match (url_domain(url.as_str()), url_domain(base.as_str())) {
        (Some(target), Some(page)) => target != page,
        _ => false,
    }
}

/// Cheapest single offer that is not out of stock and links somewhere. With
/// `off_site_only`, links back into the page's own domain are skipped.
fn best_store_offer(
    offers: &[JsonLdOffer],
    base_url: &str,
    off_site_only: bool,
) -> Option<(String, Option<String>)> {
    let base = Url::parse(base_url).ok()?;
    offers
        .iter()
        .filter(|o| !o.is_aggregate)
        .filter(|o| o.availability != Some(Availability::OutOfStock))
        .filter_map(|o| {
            let price = o.price?;
            let url = base.join(o.url.as_deref()?).ok()?;
            Some((price, url, o.seller.clone()))
        })
        .filter(|(_, url, _)| matches!(url.scheme(), "http" | "https"))
        .filter(|(_, url, _)| !off_site_only || is_off_site(url, &base))
        .min_by_key(|(price, _, _)| *price)
        .map(|(_, url, seller)| (url.to_string(), seller))
}

fn direct_offer(
    requested_url: &str,
    final_url: &str,
    html: &str,
    text: &str,
    offers: &[JsonLdOffer],
    country: &Country,
) -> Result<ExtractedOffer, ExtractionError> {
    let text_availability = availability_from_text(text);
    let fallback_currency = || {
        find_price_in_text(text, country)
            .map(|(_, currency)| currency)
            .or_else(|| market_currency(country).map(ToString::to_string))
    };

    let build = |price: Decimal,
                 currency: Option<String>,
                 availability: Option<Availability>,
                 store_name: Option<String>|
     -> Result<ExtractedOffer, ExtractionError> {
        let currency = currency
            .or_else(fallback_currency)
            .ok_or_else(|| ExtractionError::Parse {
                url: requested_url.to_string(),
                reason: "price has no currency".to_string(),
            })?;
        Ok(ExtractedOffer {
            price,
            currency,
            store_name,
            availability: availability.unwrap_or(text_availability),
            final_url: final_url.to_string(),
        })
    };

    if let Some((offer, price)) = offers.iter().find_map(|o| o.price.map(|p| (o, p))) {
        tracing::debug!(url = final_url, %price, "price from json-ld");
        return build(
            price,
            offer.currency.clone(),
            offer.availability,
            offer.seller.clone(),
        );
    }

    if let Some((price, currency)) = meta_price(html) {
        tracing::debug!(url = final_url, %price, "price from meta tags");
        return build(price, currency, None, None);
    }

    if let Some((price, currency)) = find_price_in_text(text, country) {
        tracing::debug!(url = final_url, %price, "price from page text");
        return build(price, Some(currency), None, None);
    }

    Err(ExtractionError::Parse {
        url: requested_url.to_string(),
        reason: "no price found".to_string(),
    })
}
