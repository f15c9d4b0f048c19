use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

use super::{HealthProber, ProbeError};
use crate::config::ProbeConfig;
use crate::info_hash::InfoHash;
use crate::stream::SeederCount;

const PROTOCOL_ID: u64 = 0x0417_2710_1980;
const ACTION_CONNECT: u32 = 0;
const ACTION_SCRAPE: u32 = 2;
const ACTION_ERROR: u32 = 3;

/// Swarm counters from one scrape response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeStats {
    pub seeders: u32,
    pub completed: u32,
    pub leechers: u32,
}

/// UDP tracker scrape client (BEP 15).
#[derive(Debug, Clone)]
pub struct UdpScrapeProber {
    timeout: Duration,
    max_trackers: usize,
}

impl UdpScrapeProber {
    pub fn new(timeout: Duration, max_trackers: usize) -> Self {
        Self {
            timeout,
            max_trackers,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.timeout(), config.max_trackers)
    }

    /// Scrape one `udp://` tracker, bounded by this prober's timeout.
    pub async fn scrape(&self, tracker: &str, info_hash: &InfoHash) -> Result<ScrapeStats, ProbeError> {
        tokio::time::timeout(self.timeout, scrape_udp(tracker, info_hash))
            .await
            .map_err(|_| ProbeError::Timeout)?
    }
}

fn be_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = buf.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

async fn resolve(tracker: &str) -> Result<SocketAddr, ProbeError> {
    let url = Url::parse(tracker).map_err(|_| ProbeError::InvalidTracker(tracker.to_string()))?;
    if url.scheme() != "udp" {
        return Err(ProbeError::InvalidTracker(tracker.to_string()));
    }
    let host = url
        .host_str()
        .ok_or_else(|| ProbeError::InvalidTracker(tracker.to_string()))?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    let port = url.port().unwrap_or(80);

    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await?
        .next()
        .ok_or_else(|| ProbeError::InvalidTracker(tracker.to_string()));
    addr
}

/// Wait for a datagram carrying our transaction id and `expected` action.
async fn recv_reply(
    socket: &UdpSocket,
    transaction_id: u32,
    expected: u32,
    min_len: usize,
) -> Result<Vec<u8>, ProbeError> {
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.recv(&mut buf).await?;
        let reply = &buf[..n];
        let (Some(action), Some(tx)) = (be_u32(reply, 0), be_u32(reply, 4)) else {
            continue;
        };
        if tx != transaction_id {
            continue;
        }
        if action == ACTION_ERROR {
            let message = String::from_utf8_lossy(&reply[8..]).into_owned();
            return Err(ProbeError::Tracker(message));
        }
        if action == expected && n >= min_len {
            return Ok(reply.to_vec());
        }
    }
}

async fn scrape_udp(tracker: &str, info_hash: &InfoHash) -> Result<ScrapeStats, ProbeError> {
    let addr = resolve(tracker).await?;
    let bind = if addr.is_ipv4() {
        SocketAddr::from(([0u8, 0, 0, 0], 0))
    } else {
        SocketAddr::from(([0u16; 8], 0))
    };
    let socket = UdpSocket::bind(bind).await?;
    socket.connect(addr).await?;

    let transaction_id: u32 = rand::random();

    let mut connect = Vec::with_capacity(16);
    connect.extend_from_slice(&PROTOCOL_ID.to_be_bytes());
    connect.extend_from_slice(&ACTION_CONNECT.to_be_bytes());
    connect.extend_from_slice(&transaction_id.to_be_bytes());
    socket.send(&connect).await?;

    let reply = recv_reply(&socket, transaction_id, ACTION_CONNECT, 16).await?;
    let connection_id = &reply[8..16];

    let mut scrape = Vec::with_capacity(36);
    scrape.extend_from_slice(connection_id);
    scrape.extend_from_slice(&ACTION_SCRAPE.to_be_bytes());
    scrape.extend_from_slice(&transaction_id.to_be_bytes());
    scrape.extend_from_slice(&info_hash.to_bytes());
    socket.send(&scrape).await?;

    let reply = recv_reply(&socket, transaction_id, ACTION_SCRAPE, 20).await?;
    let field = |offset| be_u32(&reply, offset).unwrap_or(0);
    Ok(ScrapeStats {
        seeders: field(8),
        completed: field(12),
        leechers: field(16),
    })
}

#[async_trait]
impl HealthProber for UdpScrapeProber {
    async fn seeders(&self, trackers: &[String], info_hash: &InfoHash) -> SeederCount {
        let udp: Vec<&String> = trackers
            .iter()
            .filter(|t| t.starts_with("udp://"))
            .take(self.max_trackers)
            .collect();
        if udp.is_empty() {
            return SeederCount::Unknown;
        }

        let results = join_all(udp.iter().map(|t| self.scrape(t, info_hash))).await;

        let mut best = SeederCount::Unknown;
        for (tracker, result) in udp.iter().zip(results) {
            match result {
                Ok(stats) => best = best.max(SeederCount::Known(stats.seeders)),
                Err(e) => debug!(tracker = %tracker, error = %e, "Scrape failed"),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::test_hash;

    /// Minimal tracker answering one connect and one scrape.
    async fn spawn_tracker(seeders: u32) -> String {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();

        tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            let (n, src) = socket.recv_from(&mut buf).await.unwrap();
            assert_eq!(n, 16);
            assert_eq!(&buf[0..8], &PROTOCOL_ID.to_be_bytes());
            let tx = be_u32(&buf, 12).unwrap();

            let mut resp = Vec::new();
            resp.extend_from_slice(&ACTION_CONNECT.to_be_bytes());
            resp.extend_from_slice(&tx.to_be_bytes());
            resp.extend_from_slice(&0x1122_3344_5566_7788u64.to_be_bytes());
            socket.send_to(&resp, src).await.unwrap();

            let (n, src) = socket.recv_from(&mut buf).await.unwrap();
            assert_eq!(n, 36);
            assert_eq!(&buf[0..8], &0x1122_3344_5566_7788u64.to_be_bytes());
            assert_eq!(be_u32(&buf, 8), Some(ACTION_SCRAPE));

            let mut resp = Vec::new();
            resp.extend_from_slice(&ACTION_SCRAPE.to_be_bytes());
            resp.extend_from_slice(&tx.to_be_bytes());
            resp.extend_from_slice(&seeders.to_be_bytes());
            resp.extend_from_slice(&100u32.to_be_bytes());
            resp.extend_from_slice(&7u32.to_be_bytes());
            socket.send_to(&resp, src).await.unwrap();
        });

        format!("udp://127.0.0.1:{}/announce", port)
    }

    /// A bound socket that never answers.
    async fn silent_tracker() -> (UdpSocket, String) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let url = format!("udp://127.0.0.1:{}/announce", socket.local_addr().unwrap().port());
        (socket, url)
    }

    fn hash() -> InfoHash {
        InfoHash::parse(&test_hash(1)).unwrap()
    }

    #[tokio::test]
    async fn test_scrape_reads_counters() {
        let tracker = spawn_tracker(42).await;
        let prober = UdpScrapeProber::new(Duration::from_secs(2), 3);
        let stats = prober.scrape(&tracker, &hash()).await.unwrap();
        assert_eq!(
            stats,
            ScrapeStats {
                seeders: 42,
                completed: 100,
                leechers: 7
            }
        );
    }

    #[tokio::test]
    async fn test_seeders_takes_maximum() {
        let a = spawn_tracker(5).await;
        let b = spawn_tracker(17).await;
        let prober = UdpScrapeProber::new(Duration::from_secs(2), 3);
        let count = prober.seeders(&[a, b], &hash()).await;
        assert_eq!(count, SeederCount::Known(17));
    }

    #[tokio::test]
    async fn test_zero_seeders_is_known() {
        let tracker = spawn_tracker(0).await;
        let prober = UdpScrapeProber::new(Duration::from_secs(2), 3);
        assert_eq!(prober.seeders(&[tracker], &hash()).await, SeederCount::Known(0));
    }

    #[tokio::test]
    async fn test_no_udp_trackers_is_unknown() {
        let prober = UdpScrapeProber::new(Duration::from_secs(2), 3);
        let trackers = vec!["http://tracker.example/announce".to_string()];
        assert_eq!(prober.seeders(&trackers, &hash()).await, SeederCount::Unknown);
        assert_eq!(prober.seeders(&[], &hash()).await, SeederCount::Unknown);
    }

    #[tokio::test]
    async fn test_timeout_is_unknown() {
        let (_socket, tracker) = silent_tracker().await;
        let prober = UdpScrapeProber::new(Duration::from_millis(200), 3);
        let err = prober.scrape(&tracker, &hash()).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout));
        assert_eq!(prober.seeders(&[tracker], &hash()).await, SeederCount::Unknown);
    }

    #[tokio::test]
    async fn test_one_silent_tracker_does_not_hide_answer() {
        let (_socket, silent) = silent_tracker().await;
        let live = spawn_tracker(9).await;
        let prober = UdpScrapeProber::new(Duration::from_millis(500), 3);
        assert_eq!(
            prober.seeders(&[silent, live], &hash()).await,
            SeederCount::Known(9)
        );
    }

    #[tokio::test]
    async fn test_invalid_tracker_url() {
        let prober = UdpScrapeProber::new(Duration::from_secs(1), 3);
        let err = prober.scrape("not a url", &hash()).await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidTracker(_)));
    }

    #[tokio::test]
    async fn test_resolve_tracker_address() {
        let addr = resolve("udp://127.0.0.1:6969/announce").await.unwrap();
        assert_eq!(addr, "127.0.0.1:6969".parse::<SocketAddr>().unwrap());

        let addr = resolve("udp://[::1]:1337").await.unwrap();
        assert_eq!(addr.port(), 1337);
        assert!(addr.ip().is_loopback());

        assert!(matches!(
            resolve("http://127.0.0.1:80/announce").await,
            Err(ProbeError::InvalidTracker(_))
        ));
    }
}
