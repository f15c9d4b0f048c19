//! Cinemeta (Stremio's public metadata addon) client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Meta, MetadataError, MetadataProvider};
use crate::config::MetadataConfig;
use crate::content::ContentType;

pub struct CinemetaClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    meta: Option<MetaBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaBody {
    name: Option<String>,
    release_info: Option<String>,
    year: Option<serde_json::Value>,
}

/// Leading year of a release string such as "2019", "2008-2013" or "2016–".
pub fn parse_release_year(release_info: &str) -> Option<u16> {
    let digits: String = release_info
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() != 4 {
        return None;
    }
    digits.parse().ok()
}

impl CinemetaClient {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetadataProvider for CinemetaClient {
    async fn get_meta(
        &self,
        content_type: ContentType,
        imdb_id: &str,
    ) -> Result<Option<Meta>, MetadataError> {
        let url = format!(
            "{}/meta/{}/{}.json",
            self.base_url,
            content_type,
            urlencoding::encode(imdb_id)
        );
        debug!("Cinemeta lookup: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
            });
        }

        let body: MetaResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;

        let Some(meta) = body.meta else {
            return Ok(None);
        };
        let Some(name) = meta.name.filter(|n| !n.trim().is_empty()) else {
            return Ok(None);
        };

        let year = meta
            .release_info
            .as_deref()
            .and_then(parse_release_year)
            .or_else(|| match meta.year {
                Some(serde_json::Value::String(s)) => parse_release_year(&s),
                Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|y| u16::try_from(y).ok()),
                _ => None,
            });

        Ok(Some(Meta { name, year }))
    }
}
