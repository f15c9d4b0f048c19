use std::sync::Arc;

use bgstreams_core::{Aggregator, Config, SanitizedConfig, StreamCaches};

/// Shared application state
pub struct AppState {
    config: Config,
    aggregator: Aggregator,
    caches: Arc<StreamCaches>,
}

impl AppState {
    pub fn new(config: Config, aggregator: Aggregator, caches: Arc<StreamCaches>) -> Self {
        Self {
            config,
            aggregator,
            caches,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn caches(&self) -> &StreamCaches {
        &self.caches
    }
}
