use super::*;

// -----------------------------------------------------------------------
// canonicalize_url
// -----------------------------------------------------------------------

#[test]
fn canonicalize_lowercases_host_and_strips_www() {
    assert_eq!(
        canonicalize_url("https://WWW.Verkkokauppa.com/fi/product/123").as_deref(),
        Some("https://verkkokauppa.com/fi/product/123")
    );
}

#[test]
fn canonicalize_strips_tracking_params_and_fragment() {
    assert_eq!(
        canonicalize_url(
            "https://power.fi/p/42?utm_source=google&color=black&gclid=abc&utm_medium=cpc#reviews"
        )
        .as_deref(),
        Some("https://power.fi/p/42?color=black")
    );
}

#[test]
fn canonicalize_drops_query_when_only_tracking_params() {
    assert_eq!(
        canonicalize_url("https://gigantti.fi/product/x?srsltid=AfmBOo&gad_source=1").as_deref(),
        Some("https://gigantti.fi/product/x")
    );
}

#[test]
fn canonicalize_drops_default_port_and_trailing_slash() {
    assert_eq!(
        canonicalize_url("https://jimms.fi:443/fi/Product/Show/123/").as_deref(),
        Some("https://jimms.fi/fi/Product/Show/123")
    );
}

#[test]
fn canonicalize_keeps_root_path() {
    assert_eq!(
        canonicalize_url("https://hinta.fi").as_deref(),
        Some("https://hinta.fi/")
    );
}

#[test]
fn canonicalize_rejects_non_http_schemes_and_garbage() {
    assert!(canonicalize_url("ftp://files.example.com/a").is_none());
    assert!(canonicalize_url("mailto:sales@example.com").is_none());
    assert!(canonicalize_url("not a url").is_none());
    assert!(canonicalize_url("/relative/path").is_none());
}

#[test]
fn canonicalize_is_idempotent() {
    let raws = [
        "https://WWW.www.Example.co.uk/a/b/?utm_campaign=x&q=sony+wf-c510&page=2#top",
        "http://shop.example.com:8080/item?id=1&id=2",
        "https://www.com/",
        "https://idealo.de/preisvergleich/OffersOfProduct/123_-wf-c510-sony.html",
        "https://example.com/search?q=a%20b&fbclid=zzz",
    ];
    for raw in raws {
        let once = canonicalize_url(raw).unwrap();
        let twice = canonicalize_url(&once).unwrap();
        assert_eq!(once, twice, "canonicalization not idempotent for {raw}");
    }
}

// -----------------------------------------------------------------------
// fetch_url
// -----------------------------------------------------------------------

#[test]
fn fetch_url_keeps_host_and_drops_tracking() {
    assert_eq!(
        fetch_url("https://www.power.fi/p/123?utm_source=google&color=black#reviews").as_deref(),
        Some("https://www.power.fi/p/123?color=black")
    );
    assert_eq!(
        fetch_url(" https://www.jimms.fi/fi/Product/Show/1?gclid=abc ").as_deref(),
        Some("https://www.jimms.fi/fi/Product/Show/1")
    );
}

#[test]
fn fetch_url_rejects_non_http_schemes() {
    assert_eq!(fetch_url("ftp://power.fi/p"), None);
    assert_eq!(fetch_url("not a url"), None);
}

// -----------------------------------------------------------------------
// registrable_domain
// -----------------------------------------------------------------------

#[test]
fn registrable_domain_keeps_last_two_labels() {
    assert_eq!(registrable_domain("shop.verkkokauppa.com"), "verkkokauppa.com");
    assert_eq!(registrable_domain("www.power.fi"), "power.fi");
    assert_eq!(registrable_domain("power.fi"), "power.fi");
}

#[test]
fn registrable_domain_handles_multi_label_suffixes() {
    assert_eq!(registrable_domain("www.currys.co.uk"), "currys.co.uk");
    assert_eq!(registrable_domain("smile.amazon.co.uk"), "amazon.co.uk");
    assert_eq!(registrable_domain("store.jb.com.au"), "jb.com.au");
}

#[test]
fn registrable_domain_passes_ip_hosts_through() {
    assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
    assert_eq!(registrable_domain("[::1]"), "[::1]");
}

#[test]
fn domain_label_and_top_level_label() {
    assert_eq!(domain_label("amazon.co.uk"), "amazon");
    assert_eq!(top_level_label("amazon.co.uk"), "uk");
    assert_eq!(top_level_label("power.fi"), "fi");
}

// -----------------------------------------------------------------------
// normalize_candidates
// -----------------------------------------------------------------------

#[test]
fn normalize_deduplicates_canonical_collisions_keeping_first() {
    let urls = [
        "https://power.fi/p/1?utm_source=x",
        "https://www.power.fi/p/1",
        "https://gigantti.fi/p/9",
    ];
    let candidates = normalize_candidates(urls, 2);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].raw_url, "https://power.fi/p/1?utm_source=x");
    assert_eq!(candidates[0].source_rank, 0);
    assert_eq!(candidates[1].domain, "gigantti.fi");
    assert_eq!(candidates[1].source_rank, 2);
}

#[test]
fn normalize_caps_candidates_per_domain() {
    // Five URLs across two domains; the first domain appears four times.
    let urls = [
        "https://power.fi/p/1",
        "https://power.fi/p/2",
        "https://gigantti.fi/p/1",
        "https://power.fi/p/3",
        "https://shop.power.fi/p/4",
    ];
    let candidates = normalize_candidates(urls, 2);
    let power: Vec<_> = candidates.iter().filter(|c| c.domain == "power.fi").collect();
    assert_eq!(power.len(), 2);
    assert_eq!(power[0].source_rank, 0);
    assert_eq!(power[1].source_rank, 1);
    assert_eq!(candidates.len(), 3);
}

#[test]
fn normalize_preserves_relative_rank_order() {
    let urls = [
        "https://b.example.com/1",
        "not-a-url",
        "https://a.example.org/2",
        "https://c.example.net/3",
    ];
    let candidates = normalize_candidates(urls, 2);
    let ranks: Vec<usize> = candidates.iter().map(|c| c.source_rank).collect();
    assert_eq!(ranks, vec![0, 2, 3]);
}

#[test]
fn normalize_skips_malformed_urls_without_failing() {
    let candidates = normalize_candidates(["javascript:void(0)", "", "https://"], 2);
    assert!(candidates.is_empty());
}

#[test]
fn normalized_candidates_start_with_unknown_tier() {
    let candidates = normalize_candidates(["https://power.fi/p/1"], 2);
    assert_eq!(candidates[0].tier, Tier::Unknown);
}

#[test]
fn canonical_urls_of_candidates_renormalize_to_themselves() {
    let urls = [
        "https://WWW.Power.fi/p/1/?utm_source=a#x",
        "https://hinta.fi/2162671/philips-tah9505?ref=home",
    ];
    for candidate in normalize_candidates(urls, 2) {
        assert_eq!(
            canonicalize_url(&candidate.canonical_url).as_deref(),
            Some(candidate.canonical_url.as_str())
        );
    }
}

#[test]
fn store_display_name_capitalizes_domain() {
    assert_eq!(store_display_name("verkkokauppa.com"), "Verkkokauppa.com");
    assert_eq!(store_display_name("power.fi"), "Power.fi");
    assert_eq!(store_display_name(""), "");
}
