//! URL canonicalization, registrable-domain grouping, and candidate
//! deduplication.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use buyspy_core::{CandidateUrl, Tier};
use reqwest::Url;

/// Query parameters that only carry campaign or click tracking.
const TRACKING_PARAMS: [&str; 9] = [
    "gclid", "fbclid", "msclkid", "ref", "ref_src", "mc_cid", "mc_eid", "_ga", "srsltid",
];

const TRACKING_PREFIXES: [&str; 2] = ["utm_", "gad_"];

/// Public suffixes that span two labels. Anything not listed is treated as
/// a single-label suffix (`.com`, `.fi`, `.de`).
const MULTI_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk", "ltd.uk", "plc.uk", "com.au", "net.au",
    "org.au", "co.nz", "org.nz", "co.jp", "ne.jp", "or.jp", "com.br", "com.mx", "com.ar",
    "com.tr", "com.cn", "com.hk", "com.sg", "com.tw", "co.in", "co.za", "co.kr", "co.il",
    "com.pl", "com.ua", "co.th", "com.my", "co.id", "com.ph",
];

fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&lower.as_str())
        || TRACKING_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Strips repeated leading `www.` labels, never reducing the host to a bare
/// suffix.
fn strip_www(host: &str) -> &str {
    let mut current = host;
    while let Some(rest) = current.strip_prefix("www.") {
        if !rest.contains('.') {
            break;
        }
        current = rest;
    }
    current
}

/// Returns the canonical form of `raw`, or `None` if it is not an absolute
/// `http`/`https` URL with a host.
///
/// Canonicalization lower-cases the host, drops `www.`, the default port,
/// the fragment, tracking parameters, an empty query, and a trailing slash
/// on non-root paths. Applying it twice yields the same string.
#[must_use]
pub fn canonicalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let stripped = strip_www(&host).to_string();
    if stripped != url.host_str().unwrap_or_default() {
        url.set_host(Some(&stripped)).ok()?;
    }

    strip_tracking(&mut url);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

/// Returns the address to fetch for `raw`: the URL as found, minus its
/// fragment and tracking parameters. The host is left as-is, so
/// `www.`-only sites stay reachable.
#[must_use]
pub fn fetch_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    strip_tracking(&mut url);
    Some(url.to_string())
}

fn strip_tracking(url: &mut Url) {
    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| !is_tracking_param(name))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }
}

/// Returns the registrable domain (eTLD+1) of `host`.
///
/// `shop.verkkokauppa.com` → `verkkokauppa.com`,
/// `www.currys.co.uk` → `currys.co.uk`. IP addresses are returned as-is.
#[must_use]
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }

    let host = strip_www(&host);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_string();
    }

    let last_two = labels[labels.len() - 2..].join(".");
    let keep = if MULTI_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len() - keep..].join(".")
}

/// Registrable domain of an absolute URL, or `None` if it does not parse.
#[must_use]
pub fn url_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(registrable_domain)
}

/// The brand label of a registrable domain: `amazon.co.uk` → `amazon`.
#[must_use]
pub fn domain_label(domain: &str) -> &str {
    domain.split('.').next().unwrap_or(domain)
}

/// The last label of a domain (`currys.co.uk` → `uk`), used to infer a
/// store's country from its ccTLD.
#[must_use]
pub fn top_level_label(domain: &str) -> &str {
    domain.rsplit('.').next().unwrap_or(domain)
}

/// Human-facing store name derived from a domain: `verkkokauppa.com` →
/// `Verkkokauppa.com`.
#[must_use]
pub fn store_display_name(domain: &str) -> String {
    let mut chars = domain.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turns raw search-result URLs into deduplicated, domain-capped candidates.
///
/// `source_rank` is the URL's index in `urls`. Malformed URLs are logged and
/// skipped. When canonical URLs collide the earlier (better-ranked) entry
/// wins, and at most `per_domain_cap` candidates survive per registrable
/// domain. Output order follows the original rank. All candidates start as
/// [`Tier::Unknown`]; the tier classifier annotates them afterwards.
#[must_use]
pub fn normalize_candidates<I, S>(urls: I, per_domain_cap: usize) -> Vec<CandidateUrl>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen_canonical = HashSet::new();
    let mut per_domain: HashMap<String, usize> = HashMap::new();
    let mut candidates = Vec::new();

    for (source_rank, raw) in urls.into_iter().enumerate() {
        let raw = raw.as_ref();
        let Some(canonical_url) = canonicalize_url(raw) else {
            tracing::warn!(url = raw, source_rank, "skipping malformed candidate URL");
            continue;
        };

        if !seen_canonical.insert(canonical_url.clone()) {
            tracing::debug!(url = %canonical_url, source_rank, "duplicate candidate URL");
            continue;
        }

        let Some(domain) = url_domain(&canonical_url) else {
            tracing::warn!(url = raw, source_rank, "skipping candidate URL without a host");
            continue;
        };

        let count = per_domain.entry(domain.clone()).or_insert(0);
        if *count >= per_domain_cap {
            tracing::debug!(
                url = %canonical_url,
                domain,
                per_domain_cap,
                "domain cap reached; dropping candidate"
            );
            continue;
        }
        *count += 1;

        candidates.push(CandidateUrl {
            raw_url: raw.to_string(),
            canonical_url,
            domain,
            tier: Tier::Unknown,
            source_rank,
        });
    }

    candidates
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
