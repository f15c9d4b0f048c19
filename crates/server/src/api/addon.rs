//! Media-player addon protocol: manifest and stream lookup.
//!
//! Every stream lookup answers 200; failures surface as an empty list.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use bgstreams_core::config::parse_source_list;
use bgstreams_core::{
    Config, ContentType, SessionCredentials, SourceKind, StreamRequest, StreamResponse,
};

use crate::state::AppState;

pub const ADDON_ID: &str = "org.bgstreams.addon";
pub const ADDON_NAME: &str = "BGTorrents";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub resources: Vec<String>,
    pub types: Vec<String>,
    pub id_prefixes: Vec<String>,
    pub catalogs: Vec<serde_json::Value>,
    pub config: Vec<ManifestConfigField>,
    pub behavior_hints: ManifestHints,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestConfigField {
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestHints {
    pub configurable: bool,
    pub configuration_required: bool,
}

fn field(key: &str, title: &str) -> ManifestConfigField {
    ManifestConfigField {
        key: key.to_string(),
        field_type: "text".to_string(),
        title: title.to_string(),
    }
}

pub fn build_manifest(config: &Config) -> Manifest {
    Manifest {
        id: ADDON_ID.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: ADDON_NAME.to_string(),
        description: "Торенти от Zamunda.rip, AXELbg и Zamunda. Използването е на ваша отговорност."
            .to_string(),
        logo: config
            .server
            .public_url
            .as_ref()
            .map(|url| format!("{}/static/logo.png", url.trim_end_matches('/'))),
        resources: vec!["stream".to_string()],
        types: vec![ContentType::Movie.to_string(), ContentType::Series.to_string()],
        id_prefixes: vec!["tt".to_string()],
        catalogs: Vec::new(),
        config: vec![
            field("providers", "Източници (rip,axel,zamunda)"),
            field("axel_uid", "AXELbg UID"),
            field("axel_pass", "AXELbg Pass"),
            field("zamunda_uid", "Zamunda UID"),
            field("zamunda_pass", "Zamunda Pass"),
        ],
        behavior_hints: ManifestHints {
            configurable: true,
            configuration_required: false,
        },
    }
}

/// User settings carried in the addon URL as a JSON path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddonConfig {
    #[serde(default)]
    pub providers: Option<String>,
    #[serde(default)]
    pub axel_uid: Option<String>,
    #[serde(default)]
    pub axel_pass: Option<String>,
    #[serde(default)]
    pub zamunda_uid: Option<String>,
    #[serde(default)]
    pub zamunda_pass: Option<String>,
}

impl AddonConfig {
    /// Parse the (already percent-decoded) config segment. Anything
    /// unreadable falls back to the server defaults.
    pub fn parse(segment: &str) -> Self {
        match serde_json::from_str(segment) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable addon config");
                Self::default()
            }
        }
    }

    fn user_credentials(&self, kind: SourceKind) -> Option<SessionCredentials> {
        let (uid, pass) = match kind {
            SourceKind::Rip => return None,
            SourceKind::Axel => (&self.axel_uid, &self.axel_pass),
            SourceKind::Zamunda => (&self.zamunda_uid, &self.zamunda_pass),
        };
        SessionCredentials::new(uid.as_deref()?, pass.as_deref()?)
    }

    /// Enabled sources and credentials, falling back to the server's
    /// configuration for anything the user left out.
    pub fn to_request(
        &self,
        config: &Config,
        content_type: ContentType,
        content_id: &str,
    ) -> StreamRequest {
        let enabled = self
            .providers
            .as_deref()
            .map(parse_source_list)
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| config.sources.default_enabled.clone());

        let mut request = StreamRequest::new(content_type, content_id).with_sources(enabled);
        for kind in SourceKind::ALL {
            let credentials = self
                .user_credentials(kind)
                .or_else(|| config.sources.default_credentials(kind));
            if let Some(credentials) = credentials {
                request = request.with_credentials(kind, credentials);
            }
        }
        request
    }
}

pub async fn manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    Json(build_manifest(state.config()))
}

pub async fn manifest_with_config(
    State(state): State<Arc<AppState>>,
    Path(_config): Path<String>,
) -> Json<Manifest> {
    Json(build_manifest(state.config()))
}

pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path((content_type, id)): Path<(String, String)>,
) -> Json<StreamResponse> {
    resolve(&state, &AddonConfig::default(), &content_type, &id).await
}

pub async fn stream_with_config(
    State(state): State<Arc<AppState>>,
    Path((config, content_type, id)): Path<(String, String, String)>,
) -> Json<StreamResponse> {
    resolve(&state, &AddonConfig::parse(&config), &content_type, &id).await
}

async fn resolve(
    state: &AppState,
    addon_config: &AddonConfig,
    content_type: &str,
    id: &str,
) -> Json<StreamResponse> {
    let Ok(content_type) = content_type.parse::<ContentType>() else {
        debug!(content_type, "Unsupported content type");
        return Json(StreamResponse::default());
    };
    let id = id.strip_suffix(".json").unwrap_or(id);

    let request = addon_config.to_request(state.config(), content_type, id);
    let candidates = state.aggregator().resolve(&request).await;
    Json(StreamResponse::from_candidates(&candidates))
}
