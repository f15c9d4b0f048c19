//! Best-effort live seeder counts via UDP tracker scrape.

mod udp;

pub use udp::{ScrapeStats, UdpScrapeProber};

use async_trait::async_trait;
use thiserror::Error;

use crate::info_hash::InfoHash;
use crate::stream::SeederCount;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid tracker url: {0}")]
    InvalidTracker(String),

    #[error("tracker io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tracker timed out")]
    Timeout,

    #[error("tracker returned error: {0}")]
    Tracker(String),
}

/// Attaches a live seeder count to an info hash.
#[async_trait]
pub trait HealthProber: Send + Sync {
    /// Best seeder count reported by any of `trackers`, or `Unknown` when no
    /// tracker could be asked or none answered.
    async fn seeders(&self, trackers: &[String], info_hash: &InfoHash) -> SeederCount;
}
