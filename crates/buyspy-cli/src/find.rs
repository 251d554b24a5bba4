//! Command handlers for `find` and `classify`.

use anyhow::Context;
use buyspy_core::{Country, PipelineConfig, RetailersFile};
use buyspy_pipeline::{
    HtmlPageAnalyzer, PipelineSettings, PricePipeline, SerperSearchClient, TierClassifier,
};
use buyspy_pipeline::normalize::{registrable_domain, url_domain};

/// Builds the tier classifier from `BUYSPY_RETAILERS_PATH`, or the built-in
/// directory when unset.
pub(crate) fn load_classifier(config: &PipelineConfig) -> anyhow::Result<TierClassifier> {
    let directory = match &config.retailers_path {
        Some(path) => buyspy_core::load_retailers(path)
            .with_context(|| format!("loading retailer directory {}", path.display()))?,
        None => RetailersFile::builtin(),
    };
    Ok(TierClassifier::new(directory))
}

/// Runs one discovery and prints the outcome as JSON on stdout.
///
/// # Errors
///
/// Returns an error if the search API key is missing, a client cannot be
/// built, or the pipeline fails.
pub(crate) async fn run_find(
    config: &PipelineConfig,
    product: &str,
    country: &str,
    max_candidates: usize,
    compact: bool,
) -> anyhow::Result<()> {
    let api_key = config.require_search_api_key()?;

    let classifier = load_classifier(config)?;
    let search = SerperSearchClient::new(
        api_key,
        &config.search_base_url,
        config.request_timeout_secs,
        &config.user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;
    let analyzer = HtmlPageAnalyzer::new(
        config.request_timeout_secs,
        &config.user_agent,
        classifier.aggregator_domains(),
    )
    .map_err(|e| anyhow::anyhow!("failed to build page analyzer: {e}"))?;

    let pipeline = PricePipeline::new(
        search,
        analyzer,
        classifier,
        PipelineSettings::from_config(config),
    );
    let outcome = pipeline
        .discover_prices(product, country, max_candidates)
        .await?;

    let json = if compact {
        serde_json::to_string(&outcome)?
    } else {
        serde_json::to_string_pretty(&outcome)?
    };
    println!("{json}");
    Ok(())
}

/// Prints `{domain, tier, aggregator}` for each input as a JSON array.
///
/// # Errors
///
/// Returns an error for an unknown country code or an unreadable retailer
/// directory.
pub(crate) fn run_classify(
    config: &PipelineConfig,
    inputs: &[String],
    country: &str,
) -> anyhow::Result<()> {
    let country =
        Country::parse(country).ok_or_else(|| anyhow::anyhow!("unknown country code '{country}'"))?;
    let classifier = load_classifier(config)?;

    let rows: Vec<serde_json::Value> = inputs
        .iter()
        .map(|input| {
            let domain = domain_of(input);
            serde_json::json!({
                "domain": domain,
                "tier": classifier.classify(&domain, &country),
                "aggregator": classifier.is_aggregator(&domain),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

/// Accepts a bare domain or a full URL.
pub(crate) fn domain_of(input: &str) -> String {
    let trimmed = input.trim();
    url_domain(trimmed).unwrap_or_else(|| registrable_domain(trimmed))
}
