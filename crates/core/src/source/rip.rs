//! Public JSON archive API. Results carry magnet links, so no container
//! download is needed.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::{Listing, SiteScraper};
use super::types::{PackPolicy, SearchResult, SourceError};
use crate::config::SourceKind;
use crate::container::ContainerInfo;
use crate::content::QueryStyle;
use crate::transport::SourceTransport;

/// Categories that hold video. Uncategorised items are kept too.
pub const VIDEO_CATEGORIES: &[&str] = &[
    "Филми/HD",
    "Филми/SD",
    "Филми/DVD-R",
    "Филми/BG",
    "Документални",
    "Филми/Дублирани",
    "Blu-ray",
    "Филми/3D",
    "Сериали",
    "Сериали/HD",
    "Аниме/TV",
    "Аниме/HD",
    "Movies/HD",
    "Movies/SD",
    "Movies/DVD-R",
    "Movies/BG",
    "TV Shows",
    "TV Shows/HD",
    "Series",
    "Series/HD",
];

/// One archive item. The API is loosely typed, so ids and flags are read
/// from whatever JSON shape arrives.
#[derive(Debug, Deserialize)]
struct RipItem {
    #[serde(default)]
    external_id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    is_bgaudio: Value,
}

impl RipItem {
    fn is_video(&self) -> bool {
        match self.category.as_deref() {
            None | Some("") => true,
            Some(category) => VIDEO_CATEGORIES.contains(&category),
        }
    }

    fn id(&self) -> String {
        match &self.external_id {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn bg_audio(&self) -> bool {
        match &self.is_bgaudio {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_i64() == Some(1),
            _ => false,
        }
    }

    fn into_result(self) -> Option<SearchResult> {
        if !self.is_video() {
            return None;
        }
        let id = self.id();
        let bg_audio = self.bg_audio();
        let link = self.link.filter(|l| !l.trim().is_empty())?;
        Some(
            SearchResult::new(
                id,
                self.title.unwrap_or_default(),
                self.size.unwrap_or_default(),
                None,
                link,
            )
            .with_bg_audio(bg_audio),
        )
    }
}

/// Parse the archive response. Anything but a JSON array yields no rows.
pub fn parse_rip_listing(body: &[u8]) -> Result<Vec<SearchResult>, SourceError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| SourceError::Parse(e.to_string()))?;
    let Value::Array(items) = value else {
        warn!("Archive API returned a non-array payload");
        return Ok(Vec::new());
    };

    let total = items.len();
    let results: Vec<SearchResult> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RipItem>(item).ok())
        .filter_map(RipItem::into_result)
        .collect();
    debug!(total, video = results.len(), "Parsed archive listing");
    Ok(results)
}

pub struct RipSite {
    transport: Arc<dyn SourceTransport>,
    api_path: String,
}

impl RipSite {
    /// `api_path` is the site-relative API endpoint, e.g. `/api/torrents`.
    pub fn new(transport: Arc<dyn SourceTransport>, api_path: impl Into<String>) -> Self {
        Self {
            transport,
            api_path: api_path.into(),
        }
    }
}

#[async_trait]
impl SiteScraper for RipSite {
    fn kind(&self) -> SourceKind {
        SourceKind::Rip
    }

    fn query_style(&self) -> QueryStyle {
        QueryStyle::Title
    }

    fn requires_credentials(&self) -> bool {
        false
    }

    fn pack_policy(&self) -> PackPolicy {
        PackPolicy::Lenient
    }

    async fn fetch_listing(
        &self,
        _cookie_header: Option<&str>,
        query: &str,
    ) -> Result<Listing, SourceError> {
        let path = format!("{}?q={}", self.api_path, urlencoding::encode(query));
        let page = self.transport.fetch(&path, None, false).await?;
        if !page.is_success() {
            return Err(SourceError::Status(page.status));
        }
        Ok(Listing::Results(parse_rip_listing(&page.body)?))
    }

    async fn fetch_container(
        &self,
        _cookie_header: Option<&str>,
        download_ref: &str,
    ) -> Result<Option<ContainerInfo>, SourceError> {
        Ok(ContainerInfo::from_magnet(download_ref))
    }
}
