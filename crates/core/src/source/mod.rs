//! Upstream tracker sites. Each site implements [`SiteScraper`]; the shared
//! [`TrackerSource`] pipeline turns it into a [`SourceAdapter`].

mod auth;
mod axel;
mod html;
mod pipeline;
mod rip;
mod traits;
mod types;
mod zamunda;

pub use auth::{detect_page_state, PageState};
pub use axel::{browse_path, parse_axel_listing, AxelSite, AXEL_FALLBACK_TRACKERS};
pub use pipeline::{SourceSettings, TrackerSource};
pub use rip::{parse_rip_listing, RipSite, VIDEO_CATEGORIES};
pub use traits::{Listing, SiteScraper, SourceAdapter};
pub use types::{
    normalize_download_ref, sort_results, PackPolicy, SearchResult, SessionCredentials,
    SourceError,
};
pub use zamunda::{
    magnet_from_page, magnet_page_path, parse_zamunda_listing, search_path, ZamundaSite,
};

use reqwest::Url;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::StreamCaches;
use crate::clock::SystemClock;
use crate::config::{Config, SourceKind};
use crate::probe::HealthProber;
use crate::transport::{
    DirectTransport, FallbackTransport, HttpProxyList, HttpRelay, ProxyPool, ProxyPoolTransport,
    RelayTransport, SourceTransport, TransportError,
};

/// Split an absolute endpoint URL into its origin and site-relative path.
fn split_endpoint(url: &str) -> Result<(String, String), TransportError> {
    let parsed = Url::parse(url)
        .map_err(|e| TransportError::NoRoute(format!("invalid endpoint {}: {}", url, e)))?;
    Ok((parsed.origin().ascii_serialization(), parsed.path().to_string()))
}

/// Build every source the configuration can support, in merge order.
/// Sources that can only be reached through the relay are left out when no
/// relay is configured.
pub fn build_sources(
    config: &Config,
    caches: Arc<StreamCaches>,
    prober: Option<Arc<dyn HealthProber>>,
    relay: Option<Arc<dyn HttpRelay>>,
) -> Result<Vec<Arc<dyn SourceAdapter>>, TransportError> {
    let sources_config = &config.sources;
    let base_settings = SourceSettings {
        max_candidates: sources_config.max_candidates,
        fetch_delay: sources_config.fetch_delay(),
        probe_seeders: false,
        search_timeout: sources_config.search_timeout(),
        container_timeout: sources_config.container_timeout(),
    };
    let request_timeout = base_settings.search_timeout.max(base_settings.container_timeout);

    let mut sources: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    for kind in SourceKind::ALL {
        match kind {
            SourceKind::Rip => {
                let (origin, api_path) = split_endpoint(&sources_config.rip.api_url)?;
                let transport = Arc::new(DirectTransport::new(&origin, request_timeout)?);
                let settings = SourceSettings {
                    probe_seeders: config.probe.enabled && prober.is_some(),
                    ..base_settings.clone()
                };
                let mut source =
                    TrackerSource::new(RipSite::new(transport, api_path), caches.clone(), settings);
                if let Some(prober) = &prober {
                    source = source.with_prober(prober.clone());
                }
                sources.push(Arc::new(source));
            }
            SourceKind::Axel => {
                let axel = &sources_config.axel;
                let pool = Arc::new(ProxyPool::new(
                    Arc::new(HttpProxyList::new(axel.proxy_list_url.clone())?),
                    axel.proxy_refresh(),
                    Arc::new(SystemClock),
                ));
                let proxied: Arc<dyn SourceTransport> =
                    Arc::new(ProxyPoolTransport::new(pool, &axel.base_url, request_timeout));
                let transport: Arc<dyn SourceTransport> = match &relay {
                    Some(relay) => Arc::new(FallbackTransport::new(
                        proxied,
                        Arc::new(RelayTransport::new(relay.clone(), axel.host())),
                    )),
                    None => proxied,
                };
                let settings = SourceSettings {
                    max_candidates: axel.max_candidates,
                    ..base_settings.clone()
                };
                sources.push(Arc::new(TrackerSource::new(
                    AxelSite::new(transport),
                    caches.clone(),
                    settings,
                )));
            }
            SourceKind::Zamunda => {
                let Some(relay) = &relay else {
                    warn!("No relay configured, zamunda will return no streams");
                    continue;
                };
                let transport = Arc::new(RelayTransport::new(
                    relay.clone(),
                    sources_config.zamunda.host.clone(),
                ));
                sources.push(Arc::new(TrackerSource::new(
                    ZamundaSite::new(transport),
                    caches.clone(),
                    base_settings.clone(),
                )));
            }
        }
        info!(source = %kind, "Source ready");
    }
    Ok(sources)
}
