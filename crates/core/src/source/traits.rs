use async_trait::async_trait;

use super::auth::PageState;
use super::types::{PackPolicy, SearchResult, SessionCredentials, SourceError};
use crate::config::SourceKind;
use crate::container::ContainerInfo;
use crate::content::{ContentType, QueryStyle};
use crate::matcher::TitleFilter;
use crate::stream::StreamCandidate;

/// A searchable upstream site, as seen by the aggregator.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn query_style(&self) -> QueryStyle;

    /// Whether searching needs a session cookie pair.
    fn requires_credentials(&self) -> bool;

    /// Listing for `query`, best first. Empty when not authenticated.
    async fn search(
        &self,
        credentials: Option<&SessionCredentials>,
        query: &str,
    ) -> Result<Vec<SearchResult>, SourceError>;

    /// Resolve a listing row to its container. `None` when no info hash
    /// could be derived.
    async fn fetch_container(
        &self,
        credentials: Option<&SessionCredentials>,
        result: &SearchResult,
    ) -> Result<Option<ContainerInfo>, SourceError>;

    /// Search, filter and resolve candidates for one query.
    async fn get_streams(
        &self,
        credentials: Option<&SessionCredentials>,
        query: &str,
        content_type: ContentType,
        filter: Option<&TitleFilter>,
    ) -> Result<Vec<StreamCandidate>, SourceError>;
}

/// Outcome of fetching a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Results(Vec<SearchResult>),
    /// The site served a login/blocked page instead of results.
    NotAuthenticated(PageState),
}

/// Site-specific fetching and parsing. Caching, filtering and candidate
/// building are shared and live in [`super::TrackerSource`].
#[async_trait]
pub trait SiteScraper: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn query_style(&self) -> QueryStyle;

    fn requires_credentials(&self) -> bool;

    fn pack_policy(&self) -> PackPolicy;

    /// Trackers appended to every container from this site.
    fn extra_trackers(&self) -> Vec<String> {
        Vec::new()
    }

    async fn fetch_listing(
        &self,
        cookie_header: Option<&str>,
        query: &str,
    ) -> Result<Listing, SourceError>;

    /// `download_ref` is already normalized.
    async fn fetch_container(
        &self,
        cookie_header: Option<&str>,
        download_ref: &str,
    ) -> Result<Option<ContainerInfo>, SourceError>;
}
