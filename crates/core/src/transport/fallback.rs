use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::{FetchedPage, SourceTransport, TransportError};

/// Tries `primary`, then `secondary` when the primary route fails.
pub struct FallbackTransport {
    primary: Arc<dyn SourceTransport>,
    secondary: Arc<dyn SourceTransport>,
}

impl FallbackTransport {
    pub fn new(primary: Arc<dyn SourceTransport>, secondary: Arc<dyn SourceTransport>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl SourceTransport for FallbackTransport {
    fn describe(&self) -> String {
        format!("{} -> {}", self.primary.describe(), self.secondary.describe())
    }

    async fn fetch(
        &self,
        path: &str,
        cookie_header: Option<&str>,
        binary: bool,
    ) -> Result<FetchedPage, TransportError> {
        match self.primary.fetch(path, cookie_header, binary).await {
            Ok(page) => Ok(page),
            Err(e) => {
                warn!(
                    route = %self.primary.describe(),
                    error = %e,
                    "Primary route failed, falling back to {}",
                    self.secondary.describe()
                );
                self.secondary.fetch(path, cookie_header, binary).await
            }
        }
    }
}
