//! Text-level helpers for store pages: visible text, price patterns,
//! availability keywords, product matching.

use std::str::FromStr;
use std::sync::LazyLock;

use buyspy_core::{Availability, Country};
use regex::Regex;
use rust_decimal::Decimal;

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
        .expect("valid script/style regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Symbol or code first: `€99,90`, `$129.99`, `EUR 129,90`.
static PRICE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(€|\$|£|\bEUR|\bUSD|\bGBP)\s?(\d{1,3}(?:[ .,]\d{3})*(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?)")
        .expect("valid prefix price regex")
});

/// Amount first: `129,90 €`, `99,- €`, `1 299,00 EUR`, `249 kr`.
static PRICE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{1,3}(?:[ .]\d{3})*(?:[.,]\d{1,2}|,-)?|\d+(?:[.,]\d{1,2}|,-)?)\s?(€|EUR\b|USD\b|GBP\b|SEK\b|NOK\b|DKK\b|kr\b|£|\$)",
    )
    .expect("valid suffix price regex")
});

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta regex"));

static META_PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(?:property|name|itemprop)\s*=\s*["']([^"']+)["']"#)
        .expect("valid meta property regex")
});

static META_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)content\s*=\s*["']([^"']*)["']"#).expect("valid meta content regex")
});

/// Strips scripts, styles, and tags; decodes common entities; collapses
/// whitespace.
pub(super) fn visible_text(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace('\u{a0}', " ")
        .replace("&euro;", "€")
        .replace("&#8364;", "€")
        .replace("&pound;", "£")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Parses a human-formatted amount into a [`Decimal`].
///
/// Handles decimal commas (`99,90`), `,-` for whole amounts (`99,-`),
/// thousands separators (`1 299,00`, `1.299,00`, `1,299.99`).
pub(super) fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if let Some(whole) = s.strip_suffix(",-") {
        s = format!("{whole}.00");
    }

    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            if c > d {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (None, Some(c)) => {
            let decimals = s.len() - c - 1;
            if (1..=2).contains(&decimals) && s.matches(',').count() == 1 {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (Some(d), None) => {
            let decimals = s.len() - d - 1;
            if decimals == 3 || s.matches('.').count() > 1 {
                s.replace('.', "")
            } else {
                s
            }
        }
        (None, None) => s,
    };

    Decimal::from_str(&normalized).ok()
}

/// Maps a currency symbol or code to ISO 4217. `kr` depends on the market.
pub(super) fn currency_code(symbol: &str, country: &Country) -> Option<String> {
    let code = match symbol.trim().to_ascii_uppercase().as_str() {
        "€" | "EUR" => "EUR",
        "$" | "USD" => "USD",
        "£" | "GBP" => "GBP",
        "SEK" => "SEK",
        "NOK" => "NOK",
        "DKK" => "DKK",
        "KR" => match country.code() {
            "NO" => "NOK",
            "DK" => "DKK",
            _ => "SEK",
        },
        _ => return None,
    };
    Some(code.to_string())
}

/// Finds the first price-looking pattern in visible text.
pub(super) fn find_price_in_text(text: &str, country: &Country) -> Option<(Decimal, String)> {
    let prefix = PRICE_PREFIX_RE.captures(text).and_then(|cap| {
        let whole = cap.get(0)?;
        let currency = currency_code(cap.get(1)?.as_str(), country)?;
        let amount = parse_amount(cap.get(2)?.as_str())?;
        Some((whole.start(), amount, currency))
    });
    let suffix = PRICE_SUFFIX_RE.captures(text).and_then(|cap| {
        let whole = cap.get(0)?;
        let amount = parse_amount(cap.get(1)?.as_str())?;
        let currency = currency_code(cap.get(2)?.as_str(), country)?;
        Some((whole.start(), amount, currency))
    });

    let first = match (prefix, suffix) {
        (Some(p), Some(s)) => {
            if p.0 <= s.0 {
                p
            } else {
                s
            }
        }
        (Some(p), None) => p,
        (None, Some(s)) => s,
        (None, None) => return None,
    };
    Some((first.1, first.2))
}

/// Reads `product:price:amount` / `og:price:amount` meta tags.
pub(super) fn meta_price(html: &str) -> Option<(Decimal, Option<String>)> {
    let mut amount = None;
    let mut currency = None;

    for tag in META_TAG_RE.find_iter(html) {
        let tag = tag.as_str();
        let Some(property) = META_PROPERTY_RE
            .captures(tag)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
        else {
            continue;
        };
        let Some(content) = META_CONTENT_RE
            .captures(tag)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
        else {
            continue;
        };

        match property.as_str() {
            "product:price:amount" | "og:price:amount" | "price" if amount.is_none() => {
                amount = parse_amount(&content);
            }
            "product:price:currency" | "og:price:currency" | "pricecurrency"
                if currency.is_none() =>
            {
                currency = Some(content.to_ascii_uppercase());
            }
            _ => {}
        }
    }

    amount.map(|a| (a, currency))
}

/// Out-of-stock phrases are checked first: several contain an in-stock
/// phrase (`ei varastossa` ⊃ `varastossa`).
const OUT_OF_STOCK_PHRASES: &[&str] = &[
    "out of stock",
    "sold out",
    "currently unavailable",
    "ei varastossa",
    "loppuunmyyty",
    "tilapäisesti loppu",
    "udsolgt",
    "ausverkauft",
    "nicht verfügbar",
    "niet op voorraad",
    "slutsåld",
    "ej i lager",
    "rupture de stock",
];

const LIMITED_PHRASES: &[&str] = &[
    "limited stock",
    "limited availability",
    "few left",
    "only a few left",
    "rajoitettu",
    "vähän jäljellä",
    "begrenzt",
    "beperkt",
    "få kvar",
];

const IN_STOCK_PHRASES: &[&str] = &[
    "in stock",
    "available now",
    "add to cart",
    "add to basket",
    "varastossa",
    "lisää ostoskoriin",
    "på lager",
    "i lager",
    "tilgængelig",
    "verfügbar",
    "auf lager",
    "in voorraad",
    "en stock",
];

pub(super) fn availability_from_text(text: &str) -> Availability {
    let lower = text.to_lowercase();
    if OUT_OF_STOCK_PHRASES.iter().any(|p| lower.contains(p)) {
        Availability::OutOfStock
    } else if LIMITED_PHRASES.iter().any(|p| lower.contains(p)) {
        Availability::Limited
    } else if IN_STOCK_PHRASES.iter().any(|p| lower.contains(p)) {
        Availability::InStock
    } else {
        Availability::Unknown
    }
}

/// Maps a schema.org availability value (`https://schema.org/InStock`,
/// `InStock`, `LimitedAvailability`, …).
pub(super) fn availability_from_schema(value: &str) -> Option<Availability> {
    let name = value.rsplit('/').next().unwrap_or(value).to_ascii_lowercase();
    match name.as_str() {
        "instock" | "onlineonly" => Some(Availability::InStock),
        "limitedavailability" | "instoreonly" | "preorder" | "presale" | "backorder" => {
            Some(Availability::Limited)
        }
        "outofstock" | "soldout" | "discontinued" => Some(Availability::OutOfStock),
        _ => None,
    }
}

fn compact(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Checks that every model-number-like word of `product` (a word containing
/// a digit, such as `TAH9505` or `WF-C510`) appears in `text`, ignoring
/// case and punctuation.
pub(super) fn product_matches(text: &str, product: &str) -> bool {
    let haystack = compact(text);
    product
        .split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_ascii_digit()))
        .map(compact)
        .filter(|w| !w.is_empty())
        .all(|w| haystack.contains(&w))
}
