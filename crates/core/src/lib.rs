pub mod aggregator;
pub mod cache;
pub mod clock;
pub mod config;
pub mod container;
pub mod content;
pub mod info_hash;
pub mod matcher;
pub mod metadata;
pub mod probe;
pub mod source;
pub mod stream;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use aggregator::{Aggregator, StreamRequest};
pub use cache::{CacheSweeper, StreamCaches};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig, SourceKind,
};
pub use content::ContentType;
pub use info_hash::InfoHash;
pub use source::{build_sources, SessionCredentials, SourceAdapter};
pub use stream::{Stream, StreamCandidate, StreamResponse};
