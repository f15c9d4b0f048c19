//! Common test utilities for exercising the router in-process.
//!
//! The fixture wires the real router to mock metadata and mock sources,
//! so addon requests run end to end without network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use bgstreams_core::testing::{MockMetadata, MockSource};
use bgstreams_core::{Aggregator, Config, SourceAdapter, SourceKind, StreamCaches};
use bgstreams_server::api::create_router;
use bgstreams_server::state::AppState;

pub use bgstreams_core::testing::fixtures;

pub struct TestFixture {
    pub router: Router,
    pub metadata: Arc<MockMetadata>,
    pub rip: Arc<MockSource>,
    pub axel: Arc<MockSource>,
    pub zamunda: Arc<MockSource>,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let metadata = Arc::new(MockMetadata::new());
        metadata.add("tt0133093", "The Matrix", Some(1999));
        metadata.add("tt0903747", "Breaking Bad", Some(2008));

        let rip = Arc::new(MockSource::new(SourceKind::Rip));
        let axel = Arc::new(MockSource::new(SourceKind::Axel));
        let zamunda = Arc::new(MockSource::new(SourceKind::Zamunda));
        let sources: Vec<Arc<dyn SourceAdapter>> = vec![rip.clone(), axel.clone(), zamunda.clone()];

        let caches = Arc::new(StreamCaches::new(&config.cache));
        let aggregator = Aggregator::new(metadata.clone(), sources);
        let state = Arc::new(AppState::new(config, aggregator, caches));

        Self {
            router: create_router(state),
            metadata,
            rip,
            axel,
            zamunda,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("Origin", "https://web.strem.io")
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Percent-encode a JSON addon config for use as a path segment.
pub fn config_segment(json: &str) -> String {
    urlencoding::encode(json).into_owned()
}
