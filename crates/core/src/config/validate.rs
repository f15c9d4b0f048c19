use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Cache TTLs and sweep interval are positive
/// - Candidate limits are positive
/// - Relay URL, when present, is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let cache = &config.cache;
    for (name, value) in [
        ("cache.search_ttl_secs", cache.search_ttl_secs),
        ("cache.container_ttl_secs", cache.container_ttl_secs),
        ("cache.streams_ttl_secs", cache.streams_ttl_secs),
        ("cache.sweep_interval_secs", cache.sweep_interval_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be greater than 0",
                name
            )));
        }
    }

    if config.sources.max_candidates == 0 || config.sources.axel.max_candidates == 0 {
        return Err(ConfigError::ValidationError(
            "max_candidates must be greater than 0".to_string(),
        ));
    }

    if let Some(relay) = &config.relay {
        if relay.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relay.url cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
