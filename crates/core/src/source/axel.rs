//! HTML tracker searched by IMDB id. Reached through in-country SOCKS
//! proxies, falling back to the relay.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::auth::detect_page_state;
use super::html::{closest, leading_number, selector, text_of};
use super::traits::{Listing, SiteScraper};
use super::types::{PackPolicy, SearchResult, SourceError};
use crate::config::SourceKind;
use crate::container::ContainerInfo;
use crate::content::QueryStyle;
use crate::transport::SourceTransport;

/// Public trackers appended to every container; the private announce URL
/// alone rarely answers scrapes.
pub const AXEL_FALLBACK_TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://open.stealth.si:80/announce",
    "udp://exodus.desync.com:6969/announce",
];

static CELL: Lazy<Selector> = Lazy::new(|| selector("td"));
static DETAIL_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="details.php?id="]"#));
static DOWNLOAD_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="download.php"]"#));
static SEEDERS_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="toseeders"]"#));

static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"id=(\d+)").expect("valid id regex"));
static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+[.,]\d+\s*[GMKT]B$").expect("valid size regex"));

pub fn browse_path(query: &str) -> String {
    format!(
        "/browse.php?search={}&cat=0&incldead=0&page=0&first=0&last=50",
        urlencoding::encode(query)
    )
}

/// Parse a browse page. Each result cell holds a details link and a
/// download link; size and seeders live in sibling cells of the same row.
pub fn parse_axel_listing(html: &str) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for cell in doc.select(&CELL) {
        let Some(detail) = cell.select(&DETAIL_LINK).next() else {
            continue;
        };
        let href = detail.value().attr("href").unwrap_or_default();
        let Some(id) = ID_RE.captures(href).map(|c| c[1].to_string()) else {
            continue;
        };
        if seen.contains(&id) {
            continue;
        }
        let Some(download) = cell.select(&DOWNLOAD_LINK).next() else {
            continue;
        };
        seen.insert(id.clone());

        let title = text_of(detail);
        let download_ref = download.value().attr("href").unwrap_or_default().to_string();

        let mut size = String::new();
        let mut seeders = None;
        if let Some(row) = closest(cell, "tr") {
            for sibling in row.select(&CELL) {
                let text = text_of(sibling);
                if SIZE_RE.is_match(&text) {
                    size = text;
                }
                if let Some(link) = sibling.select(&SEEDERS_LINK).next() {
                    seeders = Some(leading_number(&text_of(link)).unwrap_or(0));
                }
            }
        }

        results.push(SearchResult::new(id, title, size, seeders, download_ref));
    }
    results
}

pub struct AxelSite {
    transport: Arc<dyn SourceTransport>,
}

impl AxelSite {
    pub fn new(transport: Arc<dyn SourceTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl SiteScraper for AxelSite {
    fn kind(&self) -> SourceKind {
        SourceKind::Axel
    }

    fn query_style(&self) -> QueryStyle {
        QueryStyle::ContentId
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    fn pack_policy(&self) -> PackPolicy {
        PackPolicy::Lenient
    }

    fn extra_trackers(&self) -> Vec<String> {
        AXEL_FALLBACK_TRACKERS.iter().map(|t| t.to_string()).collect()
    }

    async fn fetch_listing(
        &self,
        cookie_header: Option<&str>,
        query: &str,
    ) -> Result<Listing, SourceError> {
        let page = self
            .transport
            .fetch(&browse_path(query), cookie_header, false)
            .await?;
        debug!(via = %page.via, status = page.status, bytes = page.body.len(), "Fetched browse page");
        if !page.is_success() {
            return Err(SourceError::Status(page.status));
        }

        let html = page.text();
        let state = detect_page_state(&html);
        if !state.is_authenticated() {
            return Ok(Listing::NotAuthenticated(state));
        }
        Ok(Listing::Results(parse_axel_listing(&html)))
    }

    async fn fetch_container(
        &self,
        cookie_header: Option<&str>,
        download_ref: &str,
    ) -> Result<Option<ContainerInfo>, SourceError> {
        let page = self.transport.fetch(download_ref, cookie_header, true).await?;
        if !page.is_success() {
            return Err(SourceError::Status(page.status));
        }
        let info = ContainerInfo::from_torrent_bytes(&page.body);
        if info.is_none() {
            warn!(
                download_ref,
                state = ?detect_page_state(&page.text()),
                bytes = page.body.len(),
                "Download is not a torrent"
            );
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::TorrentBuilder;
    use crate::testing::MockTransport;

    const BROWSE: &str = r#"
        <html><body><a href="logout.php">Изход</a>
        <table>
          <tr>
            <td><a href="browse.php?cat=5">Movies</a></td>
            <td><a href="details.php?id=501&hit=1"><b>The.Matrix.1999.1080p.BluRay</b></a>
                <a href="download.php/501/The.Matrix.torrent">DL</a></td>
            <td>2</td>
            <td>12.5 GB</td>
            <td><a href="peerlist.php?id=501#toseeders">37</a></td>
          </tr>
          <tr>
            <td><a href="browse.php?cat=5">Movies</a></td>
            <td><a href="details.php?id=502">The.Matrix.1999.720p</a>
                <a href="https://axelbg.net/download.php/502/m.torrent">DL</a></td>
            <td>4,37 GB</td>
            <td><a href="peerlist.php?id=502#toseeders">-</a></td>
          </tr>
          <tr>
            <td><a href="details.php?id=503">No.Download.Link</a></td>
          </tr>
          <tr>
            <td><a href="details.php?id=501">Duplicate</a><a href="download.php/501/x.torrent">DL</a></td>
          </tr>
        </table></body></html>"#;

    #[test]
    fn test_parse_axel_listing() {
        let results = parse_axel_listing(BROWSE);
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].id, "501");
        assert_eq!(results[0].title, "The.Matrix.1999.1080p.BluRay");
        assert_eq!(results[0].size, "12.5 GB");
        assert_eq!(results[0].seeders, Some(37));
        assert_eq!(results[0].download_ref, "download.php/501/The.Matrix.torrent");

        assert_eq!(results[1].size, "4,37 GB");
        assert_eq!(results[1].seeders, Some(0));
    }

    #[test]
    fn test_browse_path() {
        assert_eq!(
            browse_path("tt0133093"),
            "/browse.php?search=tt0133093&cat=0&incldead=0&page=0&first=0&last=50"
        );
    }

    #[tokio::test]
    async fn test_login_page_is_not_authenticated() {
        let transport = Arc::new(MockTransport::new("axel"));
        transport.add_page(
            &browse_path("tt1"),
            200,
            r#"<form action="takelogin.php"><a href="login.php">Вход</a></form>"#.as_bytes(),
        );
        let site = AxelSite::new(transport);

        assert!(matches!(
            site.fetch_listing(Some("uid=1; pass=x"), "tt1").await.unwrap(),
            Listing::NotAuthenticated(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let transport = Arc::new(MockTransport::new("axel"));
        transport.add_page(&browse_path("tt0133093"), 200, BROWSE.as_bytes());
        let site = AxelSite::new(transport);

        let Listing::Results(results) = site
            .fetch_listing(Some("uid=1; pass=x"), "tt0133093")
            .await
            .unwrap()
        else {
            panic!("expected results");
        };
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_container() {
        let transport = Arc::new(MockTransport::new("axel"));
        let torrent = TorrentBuilder::new("The.Matrix.1999.mkv")
            .announce("http://axelbg.net/announce.php?passkey=abc")
            .build();
        transport.add_page("/download.php/501/The.Matrix.torrent", 200, &torrent);
        transport.add_page("/download.php/502/m.torrent", 200, b"<html>login.php</html>");
        let site = AxelSite::new(transport);

        let info = site
            .fetch_container(None, "/download.php/501/The.Matrix.torrent")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.files.len(), 1);
        assert!(site
            .fetch_container(None, "/download.php/502/m.torrent")
            .await
            .unwrap()
            .is_none());
    }
}
