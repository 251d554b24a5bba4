//! Retailer directory: which store domains are trusted for which countries.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::country::Country;
use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetailerKind {
    /// Official or regional retailer serving specific countries.
    Regional,
    /// Retailer operating localized sites in many countries (`amazon.de`, `amazon.fr`).
    International,
    /// Recognized commerce site with no particular regional standing.
    Commerce,
    /// Price-comparison site listing offers from other stores.
    Aggregator,
}

impl std::fmt::Display for RetailerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetailerKind::Regional => write!(f, "regional"),
            RetailerKind::International => write!(f, "international"),
            RetailerKind::Commerce => write!(f, "commerce"),
            RetailerKind::Aggregator => write!(f, "aggregator"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerEntry {
    /// Registrable domain, e.g. `"verkkokauppa.com"`.
    pub domain: String,
    pub kind: RetailerKind,
    /// Countries the retailer serves. When empty, the country is inferred
    /// from the domain's ccTLD.
    #[serde(default)]
    pub countries: Vec<Country>,
}

impl RetailerEntry {
    fn new(domain: &str, kind: RetailerKind, countries: &[&str]) -> Self {
        Self {
            domain: domain.to_string(),
            kind,
            countries: countries.iter().filter_map(|c| Country::parse(c)).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetailersFile {
    pub retailers: Vec<RetailerEntry>,
}

impl RetailersFile {
    /// The built-in directory used when no override file is configured.
    #[must_use]
    pub fn builtin() -> Self {
        use RetailerKind::{Aggregator, Commerce, International, Regional};

        let retailers = vec![
            // Finland
            RetailerEntry::new("verkkokauppa.com", Regional, &["FI"]),
            RetailerEntry::new("power.fi", Regional, &[]),
            RetailerEntry::new("gigantti.fi", Regional, &[]),
            RetailerEntry::new("hobbyhall.fi", Regional, &[]),
            RetailerEntry::new("jimms.fi", Regional, &[]),
            RetailerEntry::new("proshop.fi", Regional, &[]),
            RetailerEntry::new("hinta.fi", Aggregator, &[]),
            RetailerEntry::new("hintaopas.fi", Aggregator, &[]),
            RetailerEntry::new("hintaseuranta.fi", Aggregator, &[]),
            RetailerEntry::new("vertaa.fi", Aggregator, &[]),
            // Sweden and the rest of the Nordics
            RetailerEntry::new("elgiganten.se", Regional, &[]),
            RetailerEntry::new("komplett.se", Regional, &[]),
            RetailerEntry::new("inet.se", Regional, &[]),
            RetailerEntry::new("prisjakt.nu", Aggregator, &["SE"]),
            RetailerEntry::new("elkjop.no", Regional, &[]),
            RetailerEntry::new("elgiganten.dk", Regional, &[]),
            // Germany
            RetailerEntry::new("otto.de", Regional, &[]),
            RetailerEntry::new("saturn.de", Regional, &[]),
            RetailerEntry::new("cyberport.de", Regional, &[]),
            RetailerEntry::new("idealo.de", Aggregator, &[]),
            RetailerEntry::new("geizhals.de", Aggregator, &[]),
            // United Kingdom
            RetailerEntry::new("currys.co.uk", Regional, &[]),
            RetailerEntry::new("argos.co.uk", Regional, &[]),
            RetailerEntry::new("johnlewis.com", Regional, &["GB"]),
            RetailerEntry::new("pricerunner.com", Aggregator, &["GB", "SE", "DK"]),
            // France
            RetailerEntry::new("fnac.com", Regional, &["FR"]),
            RetailerEntry::new("darty.com", Regional, &["FR"]),
            RetailerEntry::new("boulanger.com", Regional, &["FR"]),
            // United States
            RetailerEntry::new("bestbuy.com", Regional, &["US"]),
            RetailerEntry::new("walmart.com", Regional, &["US"]),
            RetailerEntry::new("target.com", Regional, &["US"]),
            RetailerEntry::new("bhphotovideo.com", Regional, &["US"]),
            // International chains with localized country sites
            RetailerEntry::new("amazon.com", International, &[]),
            RetailerEntry::new("ebay.com", International, &[]),
            RetailerEntry::new("mediamarkt.de", International, &[]),
            RetailerEntry::new("ikea.com", International, &[]),
            RetailerEntry::new("apple.com", International, &[]),
            // Other recognized commerce sites
            RetailerEntry::new("newegg.com", Commerce, &[]),
            RetailerEntry::new("aliexpress.com", Commerce, &[]),
            RetailerEntry::new("kelkoo.com", Aggregator, &[]),
        ];

        Self { retailers }
    }
}

/// Load and validate a retailer directory from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_retailers(path: &Path) -> Result<RetailersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RetailersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_retailers(&content)
}

/// Parse and validate a retailer directory from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::RetailersFileParse`] on malformed YAML (including
/// unknown country codes) and [`ConfigError::Validation`] on bad entries.
///
/// Domains are stored in matching form: trimmed, lower-case, without a
/// leading `www.`.
pub fn parse_retailers(content: &str) -> Result<RetailersFile, ConfigError> {
    let mut file: RetailersFile =
        serde_yaml::from_str(content).map_err(ConfigError::RetailersFileParse)?;
    for entry in &mut file.retailers {
        entry.domain = normalize_domain(&entry.domain);
    }
    validate_retailers(&file)?;
    Ok(file)
}

/// The form a retailer domain is matched in: trimmed, lower-case, without a
/// leading `www.`.
#[must_use]
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

fn validate_retailers(file: &RetailersFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in &file.retailers {
        let domain = normalize_domain(&entry.domain);
        if domain.is_empty() {
            return Err(ConfigError::Validation(
                "retailer domain must be non-empty".to_string(),
            ));
        }
        if domain.contains("://") || domain.contains('/') {
            return Err(ConfigError::Validation(format!(
                "retailer domain '{domain}' must be a bare domain, not a URL"
            )));
        }
        if !seen.insert(domain.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate retailer domain: '{domain}'"
            )));
        }
    }

    Ok(())
}
