//! Mock sources and sites for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SourceKind;
use crate::container::ContainerInfo;
use crate::content::{ContentType, QueryStyle};
use crate::matcher::TitleFilter;
use crate::source::{
    Listing, PackPolicy, PageState, SearchResult, SessionCredentials, SiteScraper, SourceAdapter,
    SourceError,
};
use crate::stream::StreamCandidate;
use crate::transport::TransportError;

fn default_query_style(kind: SourceKind) -> QueryStyle {
    match kind {
        SourceKind::Axel => QueryStyle::ContentId,
        SourceKind::Rip | SourceKind::Zamunda => QueryStyle::Title,
    }
}

/// A whole source with canned stream lists, for aggregator tests.
pub struct MockSource {
    kind: SourceKind,
    requires_credentials: bool,
    streams: Mutex<Vec<StreamCandidate>>,
    streams_by_query: Mutex<HashMap<String, Vec<StreamCandidate>>>,
    failure: Mutex<Option<String>>,
    queries: Mutex<Vec<String>>,
    last_credentials: Mutex<Option<String>>,
    last_filter: Mutex<Option<TitleFilter>>,
}

impl MockSource {
    /// Every kind but `Rip` requires credentials by default.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            requires_credentials: kind != SourceKind::Rip,
            streams: Mutex::new(Vec::new()),
            streams_by_query: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
            last_credentials: Mutex::new(None),
            last_filter: Mutex::new(None),
        }
    }

    pub fn without_credentials(mut self) -> Self {
        self.requires_credentials = false;
        self
    }

    /// Streams returned for any query without a specific entry.
    pub fn set_streams(&self, streams: Vec<StreamCandidate>) {
        *self.streams.lock().unwrap() = streams;
    }

    pub fn set_streams_for(&self, query: &str, streams: Vec<StreamCandidate>) {
        self.streams_by_query
            .lock()
            .unwrap()
            .insert(query.to_string(), streams);
    }

    /// Make every `get_streams` call fail.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Uid of the credentials passed to the last call.
    pub fn last_credentials(&self) -> Option<String> {
        self.last_credentials.lock().unwrap().clone()
    }

    pub fn last_filter(&self) -> Option<TitleFilter> {
        self.last_filter.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn query_style(&self) -> QueryStyle {
        default_query_style(self.kind)
    }

    fn requires_credentials(&self) -> bool {
        self.requires_credentials
    }

    async fn search(
        &self,
        _credentials: Option<&SessionCredentials>,
        _query: &str,
    ) -> Result<Vec<SearchResult>, SourceError> {
        Ok(Vec::new())
    }

    async fn fetch_container(
        &self,
        _credentials: Option<&SessionCredentials>,
        _result: &SearchResult,
    ) -> Result<Option<ContainerInfo>, SourceError> {
        Ok(None)
    }

    async fn get_streams(
        &self,
        credentials: Option<&SessionCredentials>,
        query: &str,
        _content_type: ContentType,
        filter: Option<&TitleFilter>,
    ) -> Result<Vec<StreamCandidate>, SourceError> {
        self.queries.lock().unwrap().push(query.to_string());
        *self.last_credentials.lock().unwrap() = credentials.map(|c| c.uid().to_string());
        *self.last_filter.lock().unwrap() = filter.cloned();

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(SourceError::Transport(TransportError::NoRoute(message)));
        }
        if let Some(streams) = self.streams_by_query.lock().unwrap().get(query) {
            return Ok(streams.clone());
        }
        Ok(self.streams.lock().unwrap().clone())
    }
}

/// A site with a canned listing and containers, for pipeline tests.
pub struct MockSite {
    kind: SourceKind,
    pack_policy: PackPolicy,
    delay: Option<Duration>,
    listing: Mutex<Vec<SearchResult>>,
    not_authenticated: Mutex<bool>,
    containers: Mutex<HashMap<String, Vec<u8>>>,
    listing_calls: AtomicUsize,
    container_calls: AtomicUsize,
    last_cookies: Mutex<Option<String>>,
}

impl MockSite {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            pack_policy: PackPolicy::Lenient,
            delay: None,
            listing: Mutex::new(Vec::new()),
            not_authenticated: Mutex::new(false),
            containers: Mutex::new(HashMap::new()),
            listing_calls: AtomicUsize::new(0),
            container_calls: AtomicUsize::new(0),
            last_cookies: Mutex::new(None),
        }
    }

    pub fn with_pack_policy(mut self, policy: PackPolicy) -> Self {
        self.pack_policy = policy;
        self
    }

    /// Delay every listing fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_listing(&self, results: Vec<SearchResult>) {
        *self.listing.lock().unwrap() = results;
        *self.not_authenticated.lock().unwrap() = false;
    }

    /// Serve a login page until the next `set_listing`.
    pub fn set_not_authenticated(&self) {
        *self.not_authenticated.lock().unwrap() = true;
    }

    /// Raw bytes served for a normalized download reference.
    pub fn add_container(&self, download_ref: &str, bytes: Vec<u8>) {
        self.containers
            .lock()
            .unwrap()
            .insert(download_ref.to_string(), bytes);
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn container_calls(&self) -> usize {
        self.container_calls.load(Ordering::SeqCst)
    }

    pub fn last_cookies(&self) -> Option<String> {
        self.last_cookies.lock().unwrap().clone()
    }
}

#[async_trait]
impl SiteScraper for MockSite {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn query_style(&self) -> QueryStyle {
        default_query_style(self.kind)
    }

    fn requires_credentials(&self) -> bool {
        self.kind != SourceKind::Rip
    }

    fn pack_policy(&self) -> PackPolicy {
        self.pack_policy
    }

    async fn fetch_listing(
        &self,
        cookie_header: Option<&str>,
        _query: &str,
    ) -> Result<Listing, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_cookies.lock().unwrap() = cookie_header.map(str::to_string);

        if *self.not_authenticated.lock().unwrap() {
            return Ok(Listing::NotAuthenticated(PageState::LoginRequired));
        }
        Ok(Listing::Results(self.listing.lock().unwrap().clone()))
    }

    async fn fetch_container(
        &self,
        _cookie_header: Option<&str>,
        download_ref: &str,
    ) -> Result<Option<ContainerInfo>, SourceError> {
        self.container_calls.fetch_add(1, Ordering::SeqCst);
        if download_ref.starts_with("magnet:") {
            return Ok(ContainerInfo::from_magnet(download_ref));
        }
        let bytes = self.containers.lock().unwrap().get(download_ref).cloned();
        match bytes {
            Some(bytes) => Ok(ContainerInfo::from_torrent_bytes(&bytes)),
            None => Err(SourceError::Status(404)),
        }
    }
}
