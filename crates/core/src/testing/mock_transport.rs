//! Mock transports, relay and proxy list for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::transport::{
    FetchedPage, HttpRelay, ProxyEndpoint, ProxyListSource, RelayError, RelayResponse,
    SourceTransport, TransportError,
};

/// A recorded transport fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub path: String,
    pub cookie_header: Option<String>,
    pub binary: bool,
}

/// Serves canned pages by path. Unknown paths fail with `NoRoute`.
pub struct MockTransport {
    name: String,
    pages: Mutex<HashMap<String, (u16, Bytes)>>,
    fetches: Mutex<Vec<RecordedFetch>>,
}

impl MockTransport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pages: Mutex::new(HashMap::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn add_page(&self, path: &str, status: u16, body: impl AsRef<[u8]>) {
        self.pages.lock().unwrap().insert(
            path.to_string(),
            (status, Bytes::copy_from_slice(body.as_ref())),
        );
    }

    pub fn recorded(&self) -> Vec<RecordedFetch> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn recorded_paths(&self) -> Vec<String> {
        self.recorded().into_iter().map(|f| f.path).collect()
    }
}

#[async_trait]
impl SourceTransport for MockTransport {
    fn describe(&self) -> String {
        format!("mock {}", self.name)
    }

    async fn fetch(
        &self,
        path: &str,
        cookie_header: Option<&str>,
        binary: bool,
    ) -> Result<FetchedPage, TransportError> {
        self.fetches.lock().unwrap().push(RecordedFetch {
            path: path.to_string(),
            cookie_header: cookie_header.map(str::to_string),
            binary,
        });
        let (status, body) = self
            .pages
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::NoRoute(format!("{} has no page {}", self.name, path)))?;
        Ok(FetchedPage {
            status,
            body,
            via: self.name.clone(),
        })
    }
}

/// Relay answering from a table keyed by (host, path).
#[derive(Default)]
pub struct MockRelay {
    responses: Mutex<HashMap<(String, String), RelayResponse>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_response(&self, host: &str, path: &str, status: u16, body: impl AsRef<[u8]>) {
        self.responses.lock().unwrap().insert(
            (host.to_string(), path.to_string()),
            RelayResponse {
                status,
                body: Bytes::copy_from_slice(body.as_ref()),
            },
        );
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpRelay for MockRelay {
    async fn relay(
        &self,
        target_host: &str,
        path: &str,
        _cookie_header: Option<&str>,
        _binary: bool,
    ) -> Result<RelayResponse, RelayError> {
        let key = (target_host.to_string(), path.to_string());
        self.calls.lock().unwrap().push(key.clone());
        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(RelayError::NotConfigured)
    }
}

/// Proxy list whose contents tests can swap between refreshes.
pub struct StaticProxyList {
    proxies: Mutex<Vec<ProxyEndpoint>>,
    fail_next: AtomicBool,
    fetches: AtomicUsize,
}

impl StaticProxyList {
    pub fn new(proxies: Vec<ProxyEndpoint>) -> Self {
        Self {
            proxies: Mutex::new(proxies),
            fail_next: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, proxies: Vec<ProxyEndpoint>) {
        *self.proxies.lock().unwrap() = proxies;
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyListSource for StaticProxyList {
    async fn fetch_list(&self) -> Result<Vec<ProxyEndpoint>, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(TransportError::NoRoute("proxy list unavailable".to_string()));
        }
        Ok(self.proxies.lock().unwrap().clone())
    }
}
