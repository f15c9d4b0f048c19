use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::{Listing, SiteScraper, SourceAdapter};
use super::types::{
    normalize_download_ref, sort_results, PackPolicy, SearchResult, SessionCredentials,
    SourceError,
};
use crate::cache::{container_key, search_key, streams_key, StreamCaches};
use crate::config::SourceKind;
use crate::container::ContainerInfo;
use crate::content::{ContentType, QueryStyle};
use crate::matcher::{find_episode_file_idx, is_season_pack, TitleFilter};
use crate::probe::HealthProber;
use crate::stream::{SeederCount, StreamCandidate};

/// Per-source limits.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// Candidates whose container is resolved per query.
    pub max_candidates: usize,
    /// Pause between sequential container fetches.
    pub fetch_delay: Duration,
    /// Ask trackers for live seeder counts.
    pub probe_seeders: bool,
    pub search_timeout: Duration,
    pub container_timeout: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            fetch_delay: Duration::ZERO,
            probe_seeders: false,
            search_timeout: Duration::from_secs(20),
            container_timeout: Duration::from_secs(20),
        }
    }
}

/// The shared search → filter → resolve pipeline over one site.
pub struct TrackerSource<S> {
    site: S,
    caches: Arc<StreamCaches>,
    prober: Option<Arc<dyn HealthProber>>,
    settings: SourceSettings,
}

impl<S: SiteScraper> TrackerSource<S> {
    pub fn new(site: S, caches: Arc<StreamCaches>, settings: SourceSettings) -> Self {
        Self {
            site,
            caches,
            prober: None,
            settings,
        }
    }

    pub fn with_prober(mut self, prober: Arc<dyn HealthProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn site(&self) -> &S {
        &self.site
    }

    fn cookies(&self, credentials: Option<&SessionCredentials>) -> Option<String> {
        credentials.map(SessionCredentials::cookie_header)
    }

    /// Apply the pack policy to one resolved candidate. `None` drops it.
    fn resolve_pack(
        &self,
        candidate: StreamCandidate,
        container: &ContainerInfo,
        content_type: ContentType,
        filter: Option<&TitleFilter>,
    ) -> Option<StreamCandidate> {
        let (Some(season), Some(episode)) = (
            filter.and_then(|f| f.season),
            filter.and_then(|f| f.episode),
        ) else {
            return Some(candidate);
        };
        if content_type != ContentType::Series || !is_season_pack(&candidate.title) {
            return Some(candidate);
        }

        match find_episode_file_idx(&container.files, season, episode) {
            Some(idx) => {
                debug!(title = %candidate.title, file_idx = idx, "Episode found in season pack");
                Some(candidate.as_episode_from_pack(idx, episode))
            }
            None => match self.site.pack_policy() {
                PackPolicy::Lenient => Some(candidate.as_season_pack()),
                PackPolicy::Strict => {
                    debug!(title = %candidate.title, "Skipping season pack without episode file");
                    None
                }
            },
        }
    }

    async fn probe(&self, candidates: &mut [StreamCandidate]) {
        let Some(prober) = self.prober.as_ref().filter(|_| self.settings.probe_seeders) else {
            return;
        };
        let counts = join_all(
            candidates
                .iter()
                .map(|c| prober.seeders(&c.trackers, &c.info_hash)),
        )
        .await;
        for (candidate, count) in candidates.iter_mut().zip(counts) {
            if count != SeederCount::Unknown {
                candidate.seeders = count;
            }
        }
    }
}

#[async_trait]
impl<S: SiteScraper> SourceAdapter for TrackerSource<S> {
    fn kind(&self) -> SourceKind {
        self.site.kind()
    }

    fn query_style(&self) -> QueryStyle {
        self.site.query_style()
    }

    fn requires_credentials(&self) -> bool {
        self.site.requires_credentials()
    }

    async fn search(
        &self,
        credentials: Option<&SessionCredentials>,
        query: &str,
    ) -> Result<Vec<SearchResult>, SourceError> {
        let kind = self.kind();
        if self.requires_credentials() && credentials.is_none() {
            debug!(source = %kind, "No credentials, skipping search");
            return Ok(Vec::new());
        }

        let key = search_key(kind, query);
        if let Some(cached) = self.caches.search.get(&key) {
            return Ok(cached);
        }

        let cookies = self.cookies(credentials);
        let listing = tokio::time::timeout(
            self.settings.search_timeout,
            self.site.fetch_listing(cookies.as_deref(), query),
        )
        .await
        .map_err(|_| SourceError::Timeout(self.settings.search_timeout))??;
        let results = match listing {
            Listing::Results(results) => results,
            Listing::NotAuthenticated(state) => {
                warn!(source = %kind, ?state, "Session not accepted, returning no results");
                return Ok(Vec::new());
            }
        };

        let total = results.len();
        let mut results: Vec<SearchResult> = results
            .into_iter()
            .filter_map(|mut r| {
                r.download_ref = normalize_download_ref(&r.download_ref)?;
                Some(r)
            })
            .collect();
        sort_results(&mut results);

        debug!(source = %kind, query, total, kept = results.len(), "Search finished");
        if !results.is_empty() {
            self.caches.search.set(key, results.clone());
        }
        Ok(results)
    }

    async fn fetch_container(
        &self,
        credentials: Option<&SessionCredentials>,
        result: &SearchResult,
    ) -> Result<Option<ContainerInfo>, SourceError> {
        let Some(download_ref) = normalize_download_ref(&result.download_ref) else {
            return Ok(None);
        };
        let key = container_key(self.kind(), &download_ref);
        if let Some(cached) = self.caches.containers.get(&key) {
            return Ok(Some(cached));
        }

        let cookies = self.cookies(credentials);
        let fetched = tokio::time::timeout(
            self.settings.container_timeout,
            self.site.fetch_container(cookies.as_deref(), &download_ref),
        )
        .await
        .map_err(|_| SourceError::Timeout(self.settings.container_timeout))??;
        let Some(container) = fetched else {
            debug!(source = %self.kind(), download_ref, "No info hash in container");
            return Ok(None);
        };

        let container = container.with_extra_trackers(self.site.extra_trackers());
        self.caches.containers.set(key, container.clone());
        Ok(Some(container))
    }

    async fn get_streams(
        &self,
        credentials: Option<&SessionCredentials>,
        query: &str,
        content_type: ContentType,
        filter: Option<&TitleFilter>,
    ) -> Result<Vec<StreamCandidate>, SourceError> {
        let kind = self.kind();
        let key = streams_key(
            kind,
            query,
            content_type,
            filter.and_then(|f| f.season),
            filter.and_then(|f| f.episode),
        );
        if let Some(cached) = self.caches.streams.get(&key) {
            return Ok(cached);
        }

        let results = self.search(credentials, query).await?;
        // Id searches only need the year and season checks.
        let by_title = self.query_style() == QueryStyle::Title;
        let matching: Vec<&SearchResult> = results
            .iter()
            .filter(|r| match filter {
                None => true,
                Some(f) if by_title => f.matches(&r.title),
                Some(f) => f.matches_details(&r.title),
            })
            .collect();
        info!(
            source = %kind,
            query,
            matching = matching.len(),
            total = results.len(),
            "Filtered search results"
        );

        let mut candidates = Vec::new();
        for (i, result) in matching.into_iter().take(self.settings.max_candidates).enumerate() {
            if i > 0 && !self.settings.fetch_delay.is_zero() {
                tokio::time::sleep(self.settings.fetch_delay).await;
            }

            let container = match self.fetch_container(credentials, result).await {
                Ok(Some(container)) => container,
                Ok(None) => continue,
                Err(e) => {
                    warn!(source = %kind, id = %result.id, error = %e, "Container fetch failed");
                    continue;
                }
            };

            let candidate = StreamCandidate::from_result(kind, kind.display_label(), result, &container);
            if let Some(candidate) = self.resolve_pack(candidate, &container, content_type, filter) {
                candidates.push(candidate);
            }
        }

        self.probe(&mut candidates).await;

        info!(source = %kind, query, count = candidates.len(), "Resolved stream candidates");
        if !candidates.is_empty() {
            self.caches.streams.set(key, candidates.clone());
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::testing::fixtures::{test_hash, TorrentBuilder};
    use crate::testing::{MockProber, MockSite};

    fn source(site: MockSite) -> TrackerSource<MockSite> {
        TrackerSource::new(
            site,
            Arc::new(StreamCaches::new(&CacheConfig::default())),
            SourceSettings::default(),
        )
    }

    fn creds() -> SessionCredentials {
        SessionCredentials::new("1", "secret").unwrap()
    }

    #[tokio::test]
    async fn test_search_sorts_and_caches() {
        let site = MockSite::new(SourceKind::Axel);
        site.set_listing(vec![
            SearchResult::new("1", "Movie.720p", "1 GB", Some(9), "/download.php/1/a.torrent"),
            SearchResult::new("2", "Movie.2160p", "9 GB", Some(1), "https://axelbg.net/download.php/2/b.torrent"),
            SearchResult::new("3", "Movie.1080p", "2 GB", Some(1), " "),
        ]);
        let source = source(site);

        let results = source.search(Some(&creds()), "tt1").await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(results[0].download_ref, "/download.php/2/b.torrent");

        source.search(Some(&creds()), "tt1").await.unwrap();
        assert_eq!(source.site().listing_calls(), 1);
        assert_eq!(source.site().last_cookies().as_deref(), Some("uid=1; pass=secret"));
    }

    #[tokio::test]
    async fn test_search_without_credentials_is_empty() {
        let site = MockSite::new(SourceKind::Axel);
        site.set_listing(vec![SearchResult::new("1", "Movie", "1 GB", None, "/1")]);
        let source = source(site);

        assert!(source.search(None, "tt1").await.unwrap().is_empty());
        assert_eq!(source.site().listing_calls(), 0);
    }

    #[tokio::test]
    async fn test_not_authenticated_is_not_cached() {
        let site = MockSite::new(SourceKind::Zamunda);
        site.set_not_authenticated();
        let source = source(site);

        assert!(source.search(Some(&creds()), "movie").await.unwrap().is_empty());
        source.site().set_listing(vec![SearchResult::new("1", "Movie", "1 GB", None, "/1")]);
        assert_eq!(source.search(Some(&creds()), "movie").await.unwrap().len(), 1);
        assert_eq!(source.site().listing_calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_cached() {
        let source = source(MockSite::new(SourceKind::Rip));
        assert!(source.search(None, "nothing").await.unwrap().is_empty());
        assert!(source.search(None, "nothing").await.unwrap().is_empty());
        assert_eq!(source.site().listing_calls(), 2);
    }

    #[tokio::test]
    async fn test_container_cache_shared_across_url_forms() {
        let site = MockSite::new(SourceKind::Axel);
        site.add_container("/download.php/7/x.torrent", TorrentBuilder::new("Movie.mkv").build());
        let source = source(site);

        let relative = SearchResult::new("7", "Movie", "", None, "download.php/7/x.torrent");
        let absolute = SearchResult::new("7", "Movie", "", None, "https://axelbg.net/download.php/7/x.torrent");
        let a = source.fetch_container(Some(&creds()), &relative).await.unwrap().unwrap();
        let b = source.fetch_container(Some(&creds()), &absolute).await.unwrap().unwrap();
        assert_eq!(a.info_hash, b.info_hash);
        assert_eq!(source.site().container_calls(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_container_is_not_cached() {
        let site = MockSite::new(SourceKind::Axel);
        site.add_container("/bad", b"<html>login.php</html>".to_vec());
        let source = source(site);

        let result = SearchResult::new("1", "Movie", "", None, "/bad");
        assert!(source.fetch_container(None, &result).await.unwrap().is_none());
        assert!(source.fetch_container(None, &result).await.unwrap().is_none());
        assert_eq!(source.site().container_calls(), 2);
    }

    #[tokio::test]
    async fn test_get_streams_filters_and_limits() {
        let site = MockSite::new(SourceKind::Rip);
        let mut listing = Vec::new();
        for i in 0..5 {
            let path = format!("/{}", i);
            site.add_container(&path, TorrentBuilder::new(&format!("Soul.{}.mkv", i)).build());
            listing.push(SearchResult::new(i.to_string(), "Soul.2020.1080p", "2 GB", Some(i), path));
        }
        site.add_container("/surfer", TorrentBuilder::new("Soul.Surfer.mkv").build());
        listing.push(SearchResult::new("s", "Soul.Surfer.2011.1080p", "2 GB", Some(99), "/surfer"));
        site.set_listing(listing);

        let source = TrackerSource::new(
            site,
            Arc::new(StreamCaches::default()),
            SourceSettings {
                max_candidates: 3,
                ..SourceSettings::default()
            },
        );
        let filter = TitleFilter::movie("Soul", Some(2020));
        let streams = source
            .get_streams(None, "Soul 2020", ContentType::Movie, Some(&filter))
            .await
            .unwrap();

        assert_eq!(streams.len(), 3);
        assert!(streams.iter().all(|s| s.title == "Soul.2020.1080p"));
        assert_eq!(streams[0].seeders, SeederCount::Known(4));
        assert_eq!(source.site().container_calls(), 3);

        // second call is served from the streams cache
        source
            .get_streams(None, "Soul 2020", ContentType::Movie, Some(&filter))
            .await
            .unwrap();
        assert_eq!(source.site().listing_calls(), 1);
    }

    #[tokio::test]
    async fn test_season_pack_episode_resolution() {
        let site = MockSite::new(SourceKind::Axel);
        let pack = TorrentBuilder::new("Show.S02")
            .file("Show S02E02.mkv", 1)
            .file("Show S02E03.mkv", 1)
            .file("Show S02E04.mkv", 1)
            .file("Show S02E05.mkv", 1)
            .build();
        site.add_container("/pack", pack);
        site.set_listing(vec![SearchResult::new("1", "Show.S02.Complete.1080p", "20 GB", Some(3), "/pack")]);
        let source = source(site);

        let filter = TitleFilter::episode("Show", None, 2, 5);
        let streams = source
            .get_streams(Some(&creds()), "tt1", ContentType::Series, Some(&filter))
            .await
            .unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].file_idx, Some(3));
        assert!(streams[0].to_stream().title.starts_with("Ep. 5 (from pack)"));
    }

    #[tokio::test]
    async fn test_pack_policy_when_episode_missing() {
        for (policy, expected) in [(PackPolicy::Lenient, 1), (PackPolicy::Strict, 0)] {
            let site = MockSite::new(SourceKind::Zamunda).with_pack_policy(policy);
            site.add_container("/pack", TorrentBuilder::new("Show.S02").file("readme.txt", 1).build());
            site.set_listing(vec![SearchResult::new("1", "Show.S02.1080p", "20 GB", None, "/pack")]);
            let source = source(site);

            let filter = TitleFilter::episode("Show", None, 2, 5);
            let streams = source
                .get_streams(Some(&creds()), "Show S02E05", ContentType::Series, Some(&filter))
                .await
                .unwrap();
            assert_eq!(streams.len(), expected, "{:?}", policy);
            if let Some(stream) = streams.first() {
                assert!(stream.to_stream().title.starts_with("📦 Цял сезон"));
                assert_eq!(stream.file_idx, None);
            }
        }
    }

    #[tokio::test]
    async fn test_failed_container_fetch_skips_candidate() {
        let site = MockSite::new(SourceKind::Axel);
        site.add_container("/ok", TorrentBuilder::new("Movie.mkv").build());
        site.set_listing(vec![
            SearchResult::new("1", "Movie.1080p", "", None, "/missing"),
            SearchResult::new("2", "Movie.720p", "", None, "/ok"),
        ]);
        let source = source(site);

        let streams = source
            .get_streams(Some(&creds()), "tt1", ContentType::Movie, None)
            .await
            .unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].title, "Movie.720p");
    }

    #[tokio::test]
    async fn test_probe_overrides_listed_seeders() {
        let site = MockSite::new(SourceKind::Rip);
        let magnet = format!("magnet:?xt=urn:btih:{}&tr=udp%3A%2F%2Ft%3A1", test_hash(1));
        site.set_listing(vec![SearchResult::new("1", "Movie.1080p", "", None, magnet)]);
        let prober = Arc::new(MockProber::new());
        prober.set(&test_hash(1), SeederCount::Known(12));

        let source = TrackerSource::new(
            site,
            Arc::new(StreamCaches::default()),
            SourceSettings {
                probe_seeders: true,
                ..SourceSettings::default()
            },
        )
        .with_prober(prober.clone());

        let streams = source
            .get_streams(None, "Movie", ContentType::Movie, None)
            .await
            .unwrap();
        assert_eq!(streams[0].seeders, SeederCount::Known(12));
        assert_eq!(prober.calls(), 1);
    }

    #[tokio::test]
    async fn test_id_search_skips_title_filter() {
        let site = MockSite::new(SourceKind::Axel);
        site.add_container("/1", TorrentBuilder::new("Матрицата.mkv").build());
        site.set_listing(vec![SearchResult::new("1", "Матрицата (1999)", "", None, "/1")]);
        let source = source(site);

        let filter = TitleFilter::movie("The Matrix", Some(1999));
        let streams = source
            .get_streams(Some(&creds()), "tt0133093", ContentType::Movie, Some(&filter))
            .await
            .unwrap();
        assert_eq!(streams.len(), 1);
    }

    #[tokio::test]
    async fn test_id_search_rejects_other_seasons() {
        let site = MockSite::new(SourceKind::Axel);
        site.add_container("/1", TorrentBuilder::new("Show.S01E05.mkv").build());
        site.add_container("/2", TorrentBuilder::new("Show.S02E05.mkv").build());
        site.add_container("/3", TorrentBuilder::new("Shou.S02E05.mkv").build());
        site.set_listing(vec![
            SearchResult::new("1", "Show.S01E05.1080p", "", Some(30), "/1"),
            SearchResult::new("2", "Show.S02E05.720p", "", Some(20), "/2"),
            SearchResult::new("3", "Шоуто S02E05", "", Some(10), "/3"),
        ]);
        let source = source(site);

        let filter = TitleFilter::episode("Show", None, 2, 5);
        let streams = source
            .get_streams(Some(&creds()), "tt1", ContentType::Series, Some(&filter))
            .await
            .unwrap();
        let titles: Vec<_> = streams.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Show.S02E05.720p", "Шоуто S02E05"]);
        assert_eq!(source.site().container_calls(), 2);
    }

    #[tokio::test]
    async fn test_slow_listing_times_out() {
        let site = MockSite::new(SourceKind::Rip).with_delay(Duration::from_millis(200));
        let source = TrackerSource::new(
            site,
            Arc::new(StreamCaches::default()),
            SourceSettings {
                search_timeout: Duration::from_millis(20),
                ..SourceSettings::default()
            },
        );
        assert!(matches!(
            source.search(None, "x").await,
            Err(SourceError::Timeout(_))
        ));
    }
}
