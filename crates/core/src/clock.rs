use std::fmt::Debug;
use std::time::Instant;

/// Source of monotonic time for expiry decisions.
///
/// Caches and the proxy pool take a clock so tests can move time forward
/// without sleeping.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
