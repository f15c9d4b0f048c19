//! Canonical title/year lookup for a content id.

mod cinemeta;

pub use cinemeta::{parse_release_year, CinemetaClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentType;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status}")]
    ApiError { status: u16 },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Name and release year of a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub name: String,
    pub year: Option<u16>,
}

/// Resolves an IMDB id to its canonical name.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// `Ok(None)` when the id is unknown.
    async fn get_meta(
        &self,
        content_type: ContentType,
        imdb_id: &str,
    ) -> Result<Option<Meta>, MetadataError>;
}
