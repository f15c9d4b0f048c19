//! Inbound content identifiers and the search queries derived from them.

mod query;

pub use query::{format_episode, sanitize_query, QueryPlan, QueryStyle};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentIdError {
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("malformed content id: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Series => "series",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ContentType::Movie),
            "series" => Ok(ContentType::Series),
            other => Err(ContentIdError::UnsupportedType(other.to_string())),
        }
    }
}

/// A parsed stream request: canonical id plus, for series, the episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub content_type: ContentType,
    /// Canonical IMDB id (e.g. "tt0133093").
    pub imdb_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ContentRequest {
    /// Parse `tt123` (movie) or `tt123:<season>:<episode>` (series).
    pub fn parse(content_type: ContentType, id: &str) -> Result<Self, ContentIdError> {
        let malformed = || ContentIdError::Malformed(id.to_string());

        match content_type {
            ContentType::Movie => {
                let imdb_id = id.trim();
                if imdb_id.is_empty() || imdb_id.contains(':') {
                    return Err(malformed());
                }
                Ok(Self {
                    content_type,
                    imdb_id: imdb_id.to_string(),
                    season: None,
                    episode: None,
                })
            }
            ContentType::Series => {
                let parts: Vec<&str> = id.split(':').collect();
                let [imdb_id, season, episode] = parts.as_slice() else {
                    return Err(malformed());
                };
                if imdb_id.is_empty() {
                    return Err(malformed());
                }
                let season: u32 = season.parse().map_err(|_| malformed())?;
                let episode: u32 = episode.parse().map_err(|_| malformed())?;
                Ok(Self {
                    content_type,
                    imdb_id: imdb_id.to_string(),
                    season: Some(season),
                    episode: Some(episode),
                })
            }
        }
    }

    pub fn is_series(&self) -> bool {
        self.content_type == ContentType::Series
    }
}
