use std::collections::HashMap;

use crate::config::SourceKind;
use crate::content::ContentType;
use crate::source::SessionCredentials;

/// One inbound stream lookup, with the caller's source selection.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub content_type: ContentType,
    /// `tt123` or, for series, `tt123:<season>:<episode>`.
    pub content_id: String,
    pub enabled: Vec<SourceKind>,
    pub credentials: HashMap<SourceKind, SessionCredentials>,
}

impl StreamRequest {
    pub fn new(content_type: ContentType, content_id: impl Into<String>) -> Self {
        Self {
            content_type,
            content_id: content_id.into(),
            enabled: Vec::new(),
            credentials: HashMap::new(),
        }
    }

    pub fn with_sources(mut self, enabled: impl IntoIterator<Item = SourceKind>) -> Self {
        self.enabled = enabled.into_iter().collect();
        self
    }

    pub fn with_credentials(mut self, kind: SourceKind, credentials: SessionCredentials) -> Self {
        self.credentials.insert(kind, credentials);
        self
    }

    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn credentials_for(&self, kind: SourceKind) -> Option<&SessionCredentials> {
        self.credentials.get(&kind)
    }
}
