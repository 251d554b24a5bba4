//! Builds localized search queries from a product name and country.

use buyspy_core::{Country, SearchQuery};

use crate::error::PipelineError;

/// Localized "price / buy" keywords per country. Appending them steers
/// web search towards local shops instead of global news and reviews.
const SEARCH_MODIFIERS: &[(&str, &str)] = &[
    ("FI", "hinta suomi osta"),
    ("US", "price usa buy"),
    ("DE", "preis deutschland kaufen"),
    ("GB", "price uk buy"),
    ("FR", "prix france acheter"),
    ("SE", "pris sverige köp"),
];

const DEFAULT_MODIFIER: &str = "price buy";

/// Search-engine region codes for countries whose language is not English.
const REGION_CODES: &[(&str, &str)] = &[
    ("FI", "fi-fi"),
    ("US", "us-en"),
    ("DE", "de-de"),
    ("GB", "uk-en"),
    ("FR", "fr-fr"),
    ("SE", "se-sv"),
];

/// Builds a [`SearchQuery`] for `product` in `country`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `product` is empty or
/// whitespace, or `country` is not an ISO-3166 alpha-2 code.
pub fn formulate_query(product: &str, country: &str) -> Result<SearchQuery, PipelineError> {
    let product = product.split_whitespace().collect::<Vec<_>>().join(" ");
    if product.is_empty() {
        return Err(PipelineError::InvalidInput(
            "product name must not be empty".to_string(),
        ));
    }

    let country = Country::parse(country).ok_or_else(|| {
        PipelineError::InvalidInput(format!(
            "'{}' is not a recognized ISO-3166 alpha-2 country code",
            country.trim()
        ))
    })?;

    let modifier = lookup(SEARCH_MODIFIERS, &country).unwrap_or(DEFAULT_MODIFIER);
    let region = lookup(REGION_CODES, &country)
        .map_or_else(|| format!("{}-en", country.cc_tld()), str::to_string);
    let query = format!("{product} {modifier}");

    Ok(SearchQuery::new(product, country, region, query))
}

fn lookup(table: &[(&str, &'static str)], country: &Country) -> Option<&'static str> {
    table
        .iter()
        .find(|(code, _)| *code == country.code())
        .map(|(_, value)| *value)
}
