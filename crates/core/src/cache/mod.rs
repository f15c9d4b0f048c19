//! In-memory TTL caches shared by every source adapter.

mod sweeper;
mod ttl;

pub use sweeper::CacheSweeper;
pub use ttl::{CacheStats, TtlCache};

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, SourceKind};
use crate::container::ContainerInfo;
use crate::content::ContentType;
use crate::source::SearchResult;
use crate::stream::StreamCandidate;

/// The three cache instances used by the stream pipeline.
///
/// Constructed once at startup and handed to each adapter; tests build
/// their own isolated instance.
#[derive(Debug)]
pub struct StreamCaches {
    /// Parsed listing rows per (source, query).
    pub search: TtlCache<Vec<SearchResult>>,
    /// Parsed containers per (source, download reference). Containers are
    /// immutable once published, so this one lives longest.
    pub containers: TtlCache<ContainerInfo>,
    /// Final candidate list per (source, query, request shape).
    pub streams: TtlCache<Vec<StreamCandidate>>,
}

impl StreamCaches {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            search: TtlCache::with_clock("search", config.search_ttl(), clock.clone()),
            containers: TtlCache::with_clock("containers", config.container_ttl(), clock.clone()),
            streams: TtlCache::with_clock("streams", config.streams_ttl(), clock),
        }
    }

    /// Evict expired entries from all caches. Returns the total removed.
    pub fn sweep_all(&self) -> usize {
        self.search.sweep() + self.containers.sweep() + self.streams.sweep()
    }

    pub fn stats(&self) -> Vec<CacheStats> {
        vec![
            self.search.stats(),
            self.containers.stats(),
            self.streams.stats(),
        ]
    }
}

impl Default for StreamCaches {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

fn normalize_key_part(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Key for a source's listing of one query.
pub fn search_key(source: SourceKind, query: &str) -> String {
    format!("{}:{}", source, normalize_key_part(query))
}

/// Key for a parsed container, by normalized download reference.
pub fn container_key(source: SourceKind, download_ref: &str) -> String {
    format!("{}:{}", source, download_ref)
}

/// Key for a source's final candidates for one query and request shape.
pub fn streams_key(
    source: SourceKind,
    query: &str,
    content_type: ContentType,
    season: Option<u32>,
    episode: Option<u32>,
) -> String {
    let season = season.map(|s| s.to_string()).unwrap_or_default();
    let episode = episode.map(|e| e.to_string()).unwrap_or_default();
    format!(
        "{}:{}:{}:{}:{}",
        source,
        content_type,
        normalize_key_part(query),
        season,
        episode
    )
}
