use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::source::SessionCredentials;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Pass-through relay used to reach geo-restricted sites.
    #[serde(default)]
    pub relay: Option<RelayConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable base URL, used for the manifest logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0u8, 0, 0, 0])
}

fn default_port() -> u16 {
    7000
}

/// Upstream sites this service knows how to scrape.
///
/// Declaration order is the fixed merge order used by the aggregator.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Public JSON archive of Zamunda/ArenaBG releases (magnet links, no login).
    Rip,
    /// AXELbg tracker (login cookies, Bulgarian egress).
    Axel,
    /// Zamunda.ch tracker (login cookies, relay only).
    Zamunda,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Rip, SourceKind::Axel, SourceKind::Zamunda];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Rip => "rip",
            SourceKind::Axel => "axel",
            SourceKind::Zamunda => "zamunda",
        }
    }

    /// Human-facing name shown in stream titles.
    pub fn display_label(&self) -> &'static str {
        match self {
            SourceKind::Rip => "Zamunda.RIP",
            SourceKind::Axel => "AXELbg",
            SourceKind::Zamunda => "Zamunda",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rip" => Ok(SourceKind::Rip),
            "axel" => Ok(SourceKind::Axel),
            "zamunda" => Ok(SourceKind::Zamunda),
            other => Err(format!("unknown source: {}", other)),
        }
    }
}

/// Parse a comma separated provider list ("rip,axel"), ignoring unknown names.
pub fn parse_source_list(list: &str) -> Vec<SourceKind> {
    let mut kinds: Vec<SourceKind> = list
        .split(',')
        .filter_map(|s| s.parse().ok())
        .collect();
    kinds.sort();
    kinds.dedup();
    kinds
}

/// Source adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Sources used when a request does not carry its own provider list.
    #[serde(default = "default_enabled_sources")]
    pub default_enabled: Vec<SourceKind>,
    /// Upper bound on candidates whose container is resolved per search.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Pause between sequential container fetches against one site (ms).
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
    /// Timeout for listing/search requests (seconds).
    #[serde(default = "default_fetch_timeout_secs")]
    pub search_timeout_secs: u64,
    /// Timeout for container downloads (seconds).
    #[serde(default = "default_fetch_timeout_secs")]
    pub container_timeout_secs: u64,
    #[serde(default)]
    pub rip: RipConfig,
    #[serde(default)]
    pub axel: AxelConfig,
    #[serde(default)]
    pub zamunda: ZamundaConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            default_enabled: default_enabled_sources(),
            max_candidates: default_max_candidates(),
            fetch_delay_ms: default_fetch_delay_ms(),
            search_timeout_secs: default_fetch_timeout_secs(),
            container_timeout_secs: default_fetch_timeout_secs(),
            rip: RipConfig::default(),
            axel: AxelConfig::default(),
            zamunda: ZamundaConfig::default(),
        }
    }
}

impl SourcesConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn container_timeout(&self) -> Duration {
        Duration::from_secs(self.container_timeout_secs)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    /// Credentials configured on the server for a source, if any.
    pub fn default_credentials(&self, kind: SourceKind) -> Option<SessionCredentials> {
        let (uid, pass) = match kind {
            SourceKind::Rip => return None,
            SourceKind::Axel => (&self.axel.uid, &self.axel.pass),
            SourceKind::Zamunda => (&self.zamunda.uid, &self.zamunda.pass),
        };
        SessionCredentials::new(uid.as_deref()?, pass.as_deref()?)
    }
}

fn default_enabled_sources() -> Vec<SourceKind> {
    vec![SourceKind::Rip]
}

fn default_max_candidates() -> usize {
    10
}

fn default_fetch_delay_ms() -> u64 {
    200
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

/// Public archive API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RipConfig {
    #[serde(default = "default_rip_api_url")]
    pub api_url: String,
}

impl Default for RipConfig {
    fn default() -> Self {
        Self {
            api_url: default_rip_api_url(),
        }
    }
}

fn default_rip_api_url() -> String {
    "https://zamunda.rip/api/torrents".to_string()
}

/// AXELbg configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AxelConfig {
    #[serde(default = "default_axel_base_url")]
    pub base_url: String,
    /// JSON list of Bulgarian SOCKS proxies.
    #[serde(default = "default_proxy_list_url")]
    pub proxy_list_url: String,
    /// How long a fetched proxy list stays fresh (seconds).
    #[serde(default = "default_proxy_refresh_secs")]
    pub proxy_refresh_secs: u64,
    #[serde(default = "default_axel_max_candidates")]
    pub max_candidates: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
}

impl Default for AxelConfig {
    fn default() -> Self {
        Self {
            base_url: default_axel_base_url(),
            proxy_list_url: default_proxy_list_url(),
            proxy_refresh_secs: default_proxy_refresh_secs(),
            max_candidates: default_axel_max_candidates(),
            uid: None,
            pass: None,
        }
    }
}

impl AxelConfig {
    pub fn proxy_refresh(&self) -> Duration {
        Duration::from_secs(self.proxy_refresh_secs)
    }

    /// Host name handed to the relay.
    pub fn host(&self) -> &str {
        host_of(&self.base_url)
    }
}

fn default_axel_base_url() -> String {
    "https://axelbg.net".to_string()
}

fn default_proxy_list_url() -> String {
    "https://raw.githubusercontent.com/proxifly/free-proxy-list/main/proxies/countries/BG/data.json"
        .to_string()
}

fn default_proxy_refresh_secs() -> u64 {
    300
}

fn default_axel_max_candidates() -> usize {
    8
}

/// Zamunda.ch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZamundaConfig {
    /// Target host handed to the relay.
    #[serde(default = "default_zamunda_host")]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
}

impl Default for ZamundaConfig {
    fn default() -> Self {
        Self {
            host: default_zamunda_host(),
            uid: None,
            pass: None,
        }
    }
}

fn default_zamunda_host() -> String {
    "zamunda.ch".to_string()
}

fn host_of(url: &str) -> &str {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .split(['/', '?'])
        .next()
        .unwrap_or(without_scheme)
}

/// Relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Relay endpoint (e.g., "https://proxy.example.workers.dev")
    pub url: String,
    #[serde(default = "default_relay_timeout")]
    pub timeout_secs: u64,
}

fn default_relay_timeout() -> u64 {
    20
}

/// TTLs for the three cache instances
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_search_ttl")]
    pub search_ttl_secs: u64,
    #[serde(default = "default_container_ttl")]
    pub container_ttl_secs: u64,
    #[serde(default = "default_streams_ttl")]
    pub streams_ttl_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_secs: default_search_ttl(),
            container_ttl_secs: default_container_ttl(),
            streams_ttl_secs: default_streams_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl CacheConfig {
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }

    pub fn container_ttl(&self) -> Duration {
        Duration::from_secs(self.container_ttl_secs)
    }

    pub fn streams_ttl(&self) -> Duration {
        Duration::from_secs(self.streams_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_search_ttl() -> u64 {
    60 * 60 // 1 hour
}

fn default_container_ttl() -> u64 {
    24 * 60 * 60 // containers never change once published
}

fn default_streams_ttl() -> u64 {
    2 * 60 * 60 // 2 hours
}

fn default_sweep_interval() -> u64 {
    30 * 60 // 30 minutes
}

/// UDP tracker scrape configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_probe_timeout")]
    pub timeout_ms: u64,
    /// UDP trackers asked per candidate.
    #[serde(default = "default_max_trackers")]
    pub max_trackers: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_probe_timeout(),
            max_trackers: default_max_trackers(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_probe_timeout() -> u64 {
    3000
}

fn default_max_trackers() -> usize {
    3
}

/// Metadata lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    #[serde(default = "default_metadata_url")]
    pub base_url: String,
    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: default_metadata_url(),
            timeout_secs: default_metadata_timeout(),
        }
    }
}

fn default_metadata_url() -> String {
    "https://v3-cinemeta.strem.io".to_string()
}

fn default_metadata_timeout() -> u64 {
    10
}

/// Sanitized config for API responses (credentials redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub sources: SanitizedSourcesConfig,
    pub relay_configured: bool,
    pub cache: CacheConfig,
    pub probe: ProbeConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourcesConfig {
    pub default_enabled: Vec<SourceKind>,
    pub max_candidates: usize,
    pub fetch_delay_ms: u64,
    pub rip_api_url: String,
    pub axel_base_url: String,
    pub axel_credentials_configured: bool,
    pub zamunda_host: String,
    pub zamunda_credentials_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let sources = &config.sources;
        Self {
            server: config.server.clone(),
            sources: SanitizedSourcesConfig {
                default_enabled: sources.default_enabled.clone(),
                max_candidates: sources.max_candidates,
                fetch_delay_ms: sources.fetch_delay_ms,
                rip_api_url: sources.rip.api_url.clone(),
                axel_base_url: sources.axel.base_url.clone(),
                axel_credentials_configured: sources
                    .default_credentials(SourceKind::Axel)
                    .is_some(),
                zamunda_host: sources.zamunda.host.clone(),
                zamunda_credentials_configured: sources
                    .default_credentials(SourceKind::Zamunda)
                    .is_some(),
            },
            relay_configured: config.relay.is_some(),
            cache: config.cache.clone(),
            probe: config.probe.clone(),
            metadata: config.metadata.clone(),
        }
    }
}
