use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::{FetchedPage, SourceTransport, TransportError};
use crate::config::RelayConfig;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("relay not configured")]
    NotConfigured,
}

#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Pass-through proxy for sites that only answer from certain regions.
#[async_trait]
pub trait HttpRelay: Send + Sync {
    async fn relay(
        &self,
        target_host: &str,
        path: &str,
        cookie_header: Option<&str>,
        binary: bool,
    ) -> Result<RelayResponse, RelayError>;
}

/// Edge-worker relay: `GET <url>/?target=<host>&path=<path>&cookies=<c>[&binary=1]`.
pub struct WorkerRelay {
    client: Client,
    url: String,
}

impl WorkerRelay {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl HttpRelay for WorkerRelay {
    async fn relay(
        &self,
        target_host: &str,
        path: &str,
        cookie_header: Option<&str>,
        binary: bool,
    ) -> Result<RelayResponse, RelayError> {
        let mut params = vec![
            ("target", target_host),
            ("path", path),
            ("cookies", cookie_header.unwrap_or("")),
        ];
        if binary {
            params.push(("binary", "1"));
        }
        debug!(target_host, path, binary, "Relaying request");

        let response = self
            .client
            .get(format!("{}/", self.url))
            .query(&params)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(RelayResponse { status, body })
    }
}

/// Routes a source's fetches through an [`HttpRelay`].
pub struct RelayTransport {
    relay: Arc<dyn HttpRelay>,
    target_host: String,
}

impl RelayTransport {
    pub fn new(relay: Arc<dyn HttpRelay>, target_host: impl Into<String>) -> Self {
        Self {
            relay,
            target_host: target_host.into(),
        }
    }
}

#[async_trait]
impl SourceTransport for RelayTransport {
    fn describe(&self) -> String {
        format!("relay {}", self.target_host)
    }

    async fn fetch(
        &self,
        path: &str,
        cookie_header: Option<&str>,
        binary: bool,
    ) -> Result<FetchedPage, TransportError> {
        let response = self
            .relay
            .relay(&self.target_host, path, cookie_header, binary)
            .await?;
        Ok(FetchedPage {
            status: response.status,
            body: response.body,
            via: "relay".to_string(),
        })
    }
}
