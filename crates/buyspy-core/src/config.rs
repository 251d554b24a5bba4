use crate::pipeline_config::PipelineConfig;
use crate::ConfigError;

/// Load pipeline configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are unparsable or out of range.
pub fn load_config() -> Result<PipelineConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_config_from_env()
}

/// Load pipeline configuration from environment variables already in the process.
///
/// Unlike [`load_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are unparsable or out of range.
pub fn load_config_from_env() -> Result<PipelineConfig, ConfigError> {
    build_config(|key| std::env::var(key))
}

/// Build pipeline configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for unparsable numbers and
/// [`ConfigError::Validation`] for values outside their allowed range.
pub fn build_config<F>(lookup: F) -> Result<PipelineConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let search_api_key = lookup("BUYSPY_SEARCH_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let search_base_url = or_default("BUYSPY_SEARCH_BASE_URL", "https://google.serper.dev");
    let log_level = or_default("BUYSPY_LOG_LEVEL", "info");
    let retailers_path = lookup("BUYSPY_RETAILERS_PATH").ok().map(PathBuf::from);

    let max_candidates = parse_usize("BUYSPY_MAX_CANDIDATES", "10")?;
    let per_domain_cap = parse_usize("BUYSPY_PER_DOMAIN_CAP", "2")?;
    let concurrency = parse_usize("BUYSPY_CONCURRENCY", "4")?;
    let task_timeout_secs = parse_u64("BUYSPY_TASK_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("BUYSPY_MAX_RETRIES", "1")?;
    let retry_backoff_ms = parse_u64("BUYSPY_RETRY_BACKOFF_MS", "500")?;
    let search_retry_backoff_ms = parse_u64("BUYSPY_SEARCH_RETRY_BACKOFF_MS", "1000")?;
    let deadline_secs = parse_u64("BUYSPY_DEADLINE_SECS", "90")?;
    let request_timeout_secs = parse_u64("BUYSPY_REQUEST_TIMEOUT_SECS", "20")?;
    let user_agent = or_default("BUYSPY_USER_AGENT", "buyspy/0.1 (price-discovery)");

    let config = PipelineConfig {
        search_api_key,
        search_base_url,
        log_level,
        retailers_path,
        max_candidates,
        per_domain_cap,
        concurrency,
        task_timeout_secs,
        max_retries,
        retry_backoff_ms,
        search_retry_backoff_ms,
        deadline_secs,
        request_timeout_secs,
        user_agent,
    };
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    let positive = [
        ("BUYSPY_MAX_CANDIDATES", config.max_candidates),
        ("BUYSPY_PER_DOMAIN_CAP", config.per_domain_cap),
        ("BUYSPY_CONCURRENCY", config.concurrency),
    ];
    for (var, value) in positive {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{var} must be at least 1")));
        }
    }
    if config.task_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "BUYSPY_TASK_TIMEOUT_SECS must be at least 1".to_string(),
        ));
    }
    if config.deadline_secs == 0 {
        return Err(ConfigError::Validation(
            "BUYSPY_DEADLINE_SECS must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
