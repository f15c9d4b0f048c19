use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{FetchedPage, SourceTransport, TransportError, USER_AGENT};

/// Plain HTTPS to the site.
pub struct DirectTransport {
    client: Client,
    base_url: String,
}

impl DirectTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SourceTransport for DirectTransport {
    fn describe(&self) -> String {
        format!("direct {}", self.base_url)
    }

    async fn fetch(
        &self,
        path: &str,
        cookie_header: Option<&str>,
        _binary: bool,
    ) -> Result<FetchedPage, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT_LANGUAGE, "bg,en-US;q=0.7,en;q=0.3");
        if let Some(cookies) = cookie_header {
            request = request.header(COOKIE, cookies);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(FetchedPage {
            status,
            body,
            via: "direct".to_string(),
        })
    }
}
