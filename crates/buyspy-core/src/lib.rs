pub mod candidates;
pub mod config;
pub mod country;
pub mod offers;
pub mod pipeline_config;
pub mod retailers;

pub use candidates::{CandidateUrl, SearchQuery};
pub use config::{build_config, load_config, load_config_from_env};
pub use country::Country;
pub use offers::{AggregatorResolution, Availability, PriceRecord, RankedResult, Tier};
pub use pipeline_config::PipelineConfig;
pub use retailers::{
    load_retailers, normalize_domain, parse_retailers, RetailerEntry, RetailerKind, RetailersFile,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read retailers file {path}: {source}")]
    RetailersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse retailers file: {0}")]
    RetailersFileParse(#[source] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
