//! Mock seeder prober for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::info_hash::InfoHash;
use crate::probe::HealthProber;
use crate::stream::SeederCount;

/// Answers from a fixed table; unknown hashes report `Unknown`.
#[derive(Default)]
pub struct MockProber {
    counts: Mutex<HashMap<String, SeederCount>>,
    calls: AtomicUsize,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, info_hash: &str, count: SeederCount) {
        self.counts
            .lock()
            .unwrap()
            .insert(info_hash.to_lowercase(), count);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProber for MockProber {
    async fn seeders(&self, _trackers: &[String], info_hash: &InfoHash) -> SeederCount {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.counts
            .lock()
            .unwrap()
            .get(info_hash.as_str())
            .copied()
            .unwrap_or_default()
    }
}
