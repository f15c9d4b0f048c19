//! HTML tracker reached only through the relay. Containers are resolved
//! through the site's magnet page rather than a `.torrent` download.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::debug;

use super::auth::detect_page_state;
use super::html::{leading_number, selector, text_of};
use super::traits::{Listing, SiteScraper};
use super::types::{PackPolicy, SearchResult, SourceError};
use crate::config::SourceKind;
use crate::container::{find_magnet, ContainerInfo};
use crate::content::QueryStyle;
use crate::transport::SourceTransport;

/// Result rows carry fewer cells than this only in headers and ads.
const MIN_ROW_CELLS: usize = 8;
const TITLE_CELL: usize = 1;
const SIZE_CELL: usize = 5;

static ROW: Lazy<Selector> = Lazy::new(|| selector("tr[onmouseover]"));
static CELL: Lazy<Selector> = Lazy::new(|| selector("td"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="banan?id="]"#));
static BOLD: Lazy<Selector> = Lazy::new(|| selector("b"));
static DOWNLOAD_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="download.php"]"#));
static SEEDERS_CELL: Lazy<Selector> = Lazy::new(|| selector("td.tdseeders"));
static MAGNET_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="magnet:"]"#));

static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"id=(\d+)").expect("valid id regex"));
static FILE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/download\.php/\d+/(.+?)\.torrent").expect("valid file name regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

pub fn search_path(query: &str) -> String {
    format!(
        "/bananas?search={}&incldead=0&field=name&cat=0",
        urlencoding::encode(query)
    )
}

pub fn magnet_page_path(id: &str) -> String {
    format!("/magnetlink/download_go.php?id={}&m=x", id)
}

/// The visible title is often shortened; the torrent file name is not.
fn title_from_download_href(href: &str) -> Option<String> {
    let raw = FILE_NAME_RE.captures(href)?.get(1)?.as_str();
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(decoded.replace('.', " "))
}

/// Parse a search page. The download reference of each row is its magnet page.
pub fn parse_zamunda_listing(html: &str) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let mut results = Vec::new();

    for row in doc.select(&ROW) {
        let cells: Vec<_> = row.select(&CELL).collect();
        if cells.len() < MIN_ROW_CELLS {
            continue;
        }
        let title_cell = cells[TITLE_CELL];
        let Some(link) = title_cell.select(&TITLE_LINK).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();
        let Some(id) = ID_RE.captures(href).map(|c| c[1].to_string()) else {
            continue;
        };

        let visible = link
            .select(&BOLD)
            .next()
            .map(text_of)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text_of(link));
        let title = title_cell
            .select(&DOWNLOAD_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(title_from_download_href)
            .unwrap_or(visible);

        let size = WHITESPACE_RE
            .replace_all(&text_of(cells[SIZE_CELL]), " ")
            .into_owned();
        let seeders = row
            .select(&SEEDERS_CELL)
            .next()
            .map(|cell| leading_number(&text_of(cell)).unwrap_or(0));

        let download_ref = magnet_page_path(&id);
        results.push(SearchResult::new(id, title, size, seeders, download_ref));
    }
    results
}

/// The magnet link on a magnet page, as raw text or as an anchor.
pub fn magnet_from_page(html: &str) -> Option<String> {
    find_magnet(html).or_else(|| {
        let doc = Html::parse_document(html);
        doc.select(&MAGNET_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    })
}

pub struct ZamundaSite {
    transport: Arc<dyn SourceTransport>,
}

impl ZamundaSite {
    pub fn new(transport: Arc<dyn SourceTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl SiteScraper for ZamundaSite {
    fn kind(&self) -> SourceKind {
        SourceKind::Zamunda
    }

    fn query_style(&self) -> QueryStyle {
        QueryStyle::Title
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    /// Magnet containers carry no file list, so packs are offered whole.
    fn pack_policy(&self) -> PackPolicy {
        PackPolicy::Lenient
    }

    async fn fetch_listing(
        &self,
        cookie_header: Option<&str>,
        query: &str,
    ) -> Result<Listing, SourceError> {
        let page = self
            .transport
            .fetch(&search_path(query), cookie_header, false)
            .await?;
        debug!(via = %page.via, status = page.status, bytes = page.body.len(), "Fetched search page");
        if !page.is_success() {
            return Err(SourceError::Status(page.status));
        }

        let html = page.text();
        let state = detect_page_state(&html);
        if !state.is_authenticated() {
            return Ok(Listing::NotAuthenticated(state));
        }
        Ok(Listing::Results(parse_zamunda_listing(&html)))
    }

    async fn fetch_container(
        &self,
        cookie_header: Option<&str>,
        download_ref: &str,
    ) -> Result<Option<ContainerInfo>, SourceError> {
        let page = self.transport.fetch(download_ref, cookie_header, false).await?;
        if !page.is_success() {
            return Err(SourceError::Status(page.status));
        }
        Ok(magnet_from_page(&page.text()).and_then(|m| ContainerInfo::from_magnet(&m)))
    }
}
