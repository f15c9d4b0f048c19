use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::matcher::Quality;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Session cookie pair issued by a tracker after login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    uid: String,
    pass: String,
}

impl SessionCredentials {
    /// `None` when either token is blank.
    pub fn new(uid: &str, pass: &str) -> Option<Self> {
        let (uid, pass) = (uid.trim(), pass.trim());
        if uid.is_empty() || pass.is_empty() {
            return None;
        }
        Some(Self {
            uid: uid.to_string(),
            pass: pass.to_string(),
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn cookie_header(&self) -> String {
        format!("uid={}; pass={}", self.uid, self.pass)
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("uid", &self.uid)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// One row of a source's result listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Source-local id.
    pub id: String,
    pub title: String,
    /// Human readable size as listed ("1.4 GB").
    pub size: String,
    /// Seeders as reported by the listing, when it reports them.
    pub seeders: Option<u32>,
    /// Site path of the `.torrent`, or a magnet link.
    pub download_ref: String,
    pub quality: Quality,
    pub bg_audio: bool,
}

impl SearchResult {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        size: impl Into<String>,
        seeders: Option<u32>,
        download_ref: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            quality: Quality::from_title(&title),
            title,
            size: size.into(),
            seeders,
            download_ref: download_ref.into(),
            bg_audio: false,
        }
    }

    pub fn with_bg_audio(mut self, bg_audio: bool) -> Self {
        self.bg_audio = bg_audio;
        self
    }
}

/// Best quality first, then most seeders.
pub fn sort_results(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.quality
            .rank()
            .cmp(&a.quality.rank())
            .then_with(|| b.seeders.unwrap_or(0).cmp(&a.seeders.unwrap_or(0)))
    });
}

/// What to do with a season pack whose episode file cannot be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackPolicy {
    /// Drop the pack.
    Strict,
    /// Keep it, labelled as a whole season.
    Lenient,
}

/// Reduce a download reference to a site-relative path so that absolute and
/// relative forms of the same link share one cache entry. Magnet links are
/// kept verbatim. `None` for blank references.
pub fn normalize_download_ref(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("magnet:") {
        return Some(raw.to_string());
    }
    if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with("//") {
        let absolute = if raw.starts_with("//") {
            format!("https:{}", raw)
        } else {
            raw.to_string()
        };
        let url = Url::parse(&absolute).ok()?;
        return Some(match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        });
    }
    if raw.starts_with('/') {
        Some(raw.to_string())
    } else {
        Some(format!("/{}", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials() {
        assert!(SessionCredentials::new("", "x").is_none());
        assert!(SessionCredentials::new("1", "  ").is_none());
        let creds = SessionCredentials::new(" 12 ", "abc").unwrap();
        assert_eq!(creds.cookie_header(), "uid=12; pass=abc");
        assert!(!format!("{:?}", creds).contains("abc"));
    }

    #[test]
    fn test_normalize_download_ref() {
        assert_eq!(
            normalize_download_ref("https://axelbg.net/download.php/123/Movie.torrent").as_deref(),
            Some("/download.php/123/Movie.torrent")
        );
        assert_eq!(
            normalize_download_ref("download.php/123/Movie.torrent").as_deref(),
            Some("/download.php/123/Movie.torrent")
        );
        assert_eq!(
            normalize_download_ref("/download.php?id=5&name=x").as_deref(),
            Some("/download.php?id=5&name=x")
        );
        assert_eq!(
            normalize_download_ref("http://www.axelbg.net/download.php?id=5&name=x").as_deref(),
            Some("/download.php?id=5&name=x")
        );
        assert_eq!(normalize_download_ref("   "), None);
        assert!(normalize_download_ref("magnet:?xt=urn:btih:abc")
            .unwrap()
            .starts_with("magnet:"));
    }

    #[test]
    fn test_sort_results() {
        let mut results = vec![
            SearchResult::new("1", "Movie.720p", "1 GB", Some(100), "/1"),
            SearchResult::new("2", "Movie.1080p", "2 GB", Some(5), "/2"),
            SearchResult::new("3", "Movie.1080p.x265", "1 GB", Some(50), "/3"),
            SearchResult::new("4", "Movie", "1 GB", None, "/4"),
        ];
        sort_results(&mut results);
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1", "4"]);
    }
}
