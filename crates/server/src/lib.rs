//! HTTP boundary of the stream aggregator: addon manifest, stream lookup and
//! a small operational API.

pub mod api;
pub mod state;
