//! How a source reaches its site: directly, through the relay, or through a
//! pool of in-country SOCKS proxies. Adapters only see [`SourceTransport`].

mod direct;
mod fallback;
mod proxy_pool;
mod relay;

pub use direct::DirectTransport;
pub use fallback::FallbackTransport;
pub use proxy_pool::{HttpProxyList, ProxyEndpoint, ProxyListSource, ProxyPool, ProxyPoolTransport};
pub use relay::{HttpRelay, RelayError, RelayResponse, RelayTransport, WorkerRelay};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Browser-like user agent; some trackers reject obvious bots.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("relay failed: {0}")]
    Relay(#[from] RelayError),

    #[error("no working route: {0}")]
    NoRoute(String),
}

/// A fetched page or file.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: Bytes,
    /// Which route served it, for logs.
    pub via: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text. Invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Fetches a site-relative path with the session cookies attached.
#[async_trait]
pub trait SourceTransport: Send + Sync {
    /// Short route name for logs.
    fn describe(&self) -> String;

    /// `path` starts with `/` and includes any query string.
    async fn fetch(
        &self,
        path: &str,
        cookie_header: Option<&str>,
        binary: bool,
    ) -> Result<FetchedPage, TransportError>;
}
