use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::{Client, Proxy};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{FetchedPage, SourceTransport, TransportError, USER_AGENT};
use crate::clock::Clock;

/// Downloads shorter than this are error pages, not torrent files.
const MIN_BINARY_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyEndpoint {
    pub protocol: String,
    pub ip: String,
    pub port: u16,
}

impl ProxyEndpoint {
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.ip, self.port)
    }
}

/// Where the proxy list comes from.
#[async_trait]
pub trait ProxyListSource: Send + Sync {
    async fn fetch_list(&self) -> Result<Vec<ProxyEndpoint>, TransportError>;
}

/// Public JSON proxy list; only SOCKS entries are kept.
pub struct HttpProxyList {
    client: Client,
    url: String,
}

impl HttpProxyList {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ProxyListSource for HttpProxyList {
    async fn fetch_list(&self) -> Result<Vec<ProxyEndpoint>, TransportError> {
        let entries: Vec<ProxyEndpoint> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(entries
            .into_iter()
            .filter(|p| p.protocol == "socks5" || p.protocol == "socks4")
            .collect())
    }
}

#[derive(Debug, Default)]
struct PoolState {
    proxies: Vec<ProxyEndpoint>,
    fetched_at: Option<Instant>,
}

/// Cached proxy list, refreshed once it is older than `refresh_after`.
pub struct ProxyPool {
    source: Arc<dyn ProxyListSource>,
    refresh_after: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<PoolState>,
}

impl ProxyPool {
    pub fn new(source: Arc<dyn ProxyListSource>, refresh_after: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            refresh_after,
            clock,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Current list, refetched first if empty or stale. A failed refresh
    /// keeps serving the previous list.
    pub async fn refresh_if_stale(&self) -> Vec<ProxyEndpoint> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        let fresh = state
            .fetched_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.refresh_after);
        if fresh && !state.proxies.is_empty() {
            return state.proxies.clone();
        }

        match self.source.fetch_list().await {
            Ok(proxies) => {
                info!(count = proxies.len(), "Refreshed proxy list");
                state.proxies = proxies;
                state.fetched_at = Some(now);
            }
            Err(e) => warn!(error = %e, "Proxy list refresh failed, keeping {} stale entries", state.proxies.len()),
        }
        state.proxies.clone()
    }
}

/// Tries each pooled proxy in turn until one returns an acceptable page.
pub struct ProxyPoolTransport {
    pool: Arc<ProxyPool>,
    base_url: String,
    timeout: Duration,
}

impl ProxyPoolTransport {
    pub fn new(pool: Arc<ProxyPool>, base_url: &str, timeout: Duration) -> Self {
        Self {
            pool,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn fetch_via(
        &self,
        proxy: &ProxyEndpoint,
        url: &str,
        cookie_header: Option<&str>,
    ) -> Result<FetchedPage, TransportError> {
        let client = Client::builder()
            .proxy(Proxy::all(proxy.url())?)
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let mut request = client
            .get(url)
            .header(ACCEPT_LANGUAGE, "bg,en-US;q=0.7,en;q=0.3")
            .header(REFERER, format!("{}/", self.base_url));
        if let Some(cookies) = cookie_header {
            request = request.header(COOKIE, cookies);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(FetchedPage {
            status,
            body,
            via: format!("proxy {}", proxy.ip),
        })
    }
}

fn is_acceptable(page: &FetchedPage, binary: bool) -> bool {
    if page.status != 200 {
        return false;
    }
    if binary {
        page.body.len() > MIN_BINARY_LEN
    } else {
        !page.text().contains("SQL Error")
    }
}

#[async_trait]
impl SourceTransport for ProxyPoolTransport {
    fn describe(&self) -> String {
        "proxy pool".to_string()
    }

    async fn fetch(
        &self,
        path: &str,
        cookie_header: Option<&str>,
        binary: bool,
    ) -> Result<FetchedPage, TransportError> {
        let proxies = self.pool.refresh_if_stale().await;
        if proxies.is_empty() {
            return Err(TransportError::NoRoute("no proxies available".to_string()));
        }

        let url = format!("{}{}", self.base_url, path);
        for proxy in &proxies {
            match self.fetch_via(proxy, &url, cookie_header).await {
                Ok(page) if is_acceptable(&page, binary) => {
                    debug!(proxy = %proxy.ip, bytes = page.body.len(), "Fetched via proxy");
                    return Ok(page);
                }
                Ok(page) => debug!(proxy = %proxy.ip, status = page.status, "Proxy returned unusable page"),
                Err(e) => debug!(proxy = %proxy.ip, error = %e, "Proxy failed"),
            }
        }

        Err(TransportError::NoRoute(format!(
            "all {} proxies failed",
            proxies.len()
        )))
    }
}
