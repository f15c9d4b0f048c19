//! Fans a stream request out to every enabled source and merges the results.

mod request;
mod service;

pub use request::StreamRequest;
pub use service::{dedup_by_hash, Aggregator};
