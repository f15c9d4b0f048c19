//! Mock metadata provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::content::ContentType;
use crate::metadata::{Meta, MetadataError, MetadataProvider};

/// Metadata keyed by IMDB id, regardless of content type.
#[derive(Default)]
pub struct MockMetadata {
    entries: Mutex<HashMap<String, Meta>>,
    fail_next: AtomicBool,
    lookups: Mutex<Vec<(ContentType, String)>>,
}

impl MockMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, imdb_id: &str, name: &str, year: Option<u16>) {
        self.entries.lock().unwrap().insert(
            imdb_id.to_string(),
            Meta {
                name: name.to_string(),
                year,
            },
        );
    }

    /// Make the next lookup fail with an API error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> Vec<(ContentType, String)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataProvider for MockMetadata {
    async fn get_meta(
        &self,
        content_type: ContentType,
        imdb_id: &str,
    ) -> Result<Option<Meta>, MetadataError> {
        self.lookups
            .lock()
            .unwrap()
            .push((content_type, imdb_id.to_string()));
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(MetadataError::ApiError { status: 503 });
        }
        Ok(self.entries.lock().unwrap().get(imdb_id).cloned())
    }
}
