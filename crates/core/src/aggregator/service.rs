use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::StreamRequest;
use crate::config::SourceKind;
use crate::content::{ContentRequest, QueryPlan};
use crate::matcher::TitleFilter;
use crate::metadata::{Meta, MetadataProvider};
use crate::source::SourceAdapter;
use crate::stream::StreamCandidate;

/// Keep the first candidate seen for each info hash, preserving order.
pub fn dedup_by_hash(candidates: impl IntoIterator<Item = StreamCandidate>) -> Vec<StreamCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.info_hash.clone()))
        .collect()
}

pub struct Aggregator {
    metadata: Arc<dyn MetadataProvider>,
    /// Sorted by kind; this is the merge order.
    sources: Vec<Arc<dyn SourceAdapter>>,
}

impl Aggregator {
    pub fn new(metadata: Arc<dyn MetadataProvider>, mut sources: Vec<Arc<dyn SourceAdapter>>) -> Self {
        sources.sort_by_key(|s| s.kind());
        Self { metadata, sources }
    }

    /// Kinds of the sources this aggregator can reach, in merge order.
    pub fn available(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Resolve a request to a merged, deduplicated candidate list. Never
    /// fails: every error path yields fewer (or no) candidates.
    pub async fn resolve(&self, request: &StreamRequest) -> Vec<StreamCandidate> {
        let content = match ContentRequest::parse(request.content_type, &request.content_id) {
            Ok(content) => content,
            Err(e) => {
                debug!(id = %request.content_id, error = %e, "Rejecting content id");
                return Vec::new();
            }
        };

        let meta = match self
            .metadata
            .get_meta(content.content_type, &content.imdb_id)
            .await
        {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                info!(id = %content.imdb_id, "No metadata for content id");
                return Vec::new();
            }
            Err(e) => {
                warn!(id = %content.imdb_id, error = %e, "Metadata lookup failed");
                return Vec::new();
            }
        };

        let filter = match (content.season, content.episode) {
            (Some(season), Some(episode)) => {
                TitleFilter::episode(meta.name.clone(), meta.year, season, episode)
            }
            _ => TitleFilter::movie(meta.name.clone(), meta.year),
        };

        let active: Vec<&Arc<dyn SourceAdapter>> = self
            .sources
            .iter()
            .filter(|s| request.is_enabled(s.kind()))
            .collect();
        let per_source = join_all(
            active
                .iter()
                .map(|source| self.run_source(source.as_ref(), request, &content, &meta, &filter)),
        )
        .await;

        let counts: Vec<String> = active
            .iter()
            .zip(&per_source)
            .map(|(s, c)| format!("{}={}", s.kind(), c.len()))
            .collect();
        let merged = dedup_by_hash(per_source.into_iter().flatten());
        info!(
            id = %request.content_id,
            name = %meta.name,
            per_source = %counts.join(","),
            total = merged.len(),
            "Resolved streams"
        );
        merged
    }

    /// Run one source's query plan, trying fallbacks while results are empty.
    async fn run_source(
        &self,
        source: &dyn SourceAdapter,
        request: &StreamRequest,
        content: &ContentRequest,
        meta: &Meta,
        filter: &TitleFilter,
    ) -> Vec<StreamCandidate> {
        let kind = source.kind();
        let credentials = request.credentials_for(kind);
        if source.requires_credentials() && credentials.is_none() {
            debug!(source = %kind, "Enabled without credentials, skipping");
            return Vec::new();
        }

        let plan = QueryPlan::build(source.query_style(), content, &meta.name, meta.year);
        for query in plan.queries() {
            match source
                .get_streams(credentials, query, content.content_type, Some(filter))
                .await
            {
                Ok(streams) if !streams.is_empty() => return streams,
                Ok(_) => debug!(source = %kind, query, "No streams, trying next query"),
                Err(e) => {
                    warn!(source = %kind, query, error = %e, "Source failed");
                    return Vec::new();
                }
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentType;
    use crate::source::SessionCredentials;
    use crate::testing::fixtures::{candidate, test_hash};
    use crate::testing::{MockMetadata, MockSource};

    fn matrix_metadata() -> Arc<MockMetadata> {
        let metadata = MockMetadata::new();
        metadata.add("tt0133093", "The Matrix", Some(1999));
        Arc::new(metadata)
    }

    fn movie_request(sources: &[SourceKind]) -> StreamRequest {
        StreamRequest::new(ContentType::Movie, "tt0133093").with_sources(sources.iter().copied())
    }

    #[test]
    fn test_dedup_first_seen_wins() {
        let merged = dedup_by_hash(vec![
            candidate(SourceKind::Rip, &test_hash(1), "first"),
            candidate(SourceKind::Rip, &test_hash(2), "other"),
            candidate(SourceKind::Axel, &test_hash(1), "second"),
        ]);
        let titles: Vec<_> = merged.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "other"]);
    }

    #[tokio::test]
    async fn test_merge_in_kind_order() {
        let rip = Arc::new(MockSource::new(SourceKind::Rip));
        rip.set_streams(vec![candidate(SourceKind::Rip, &test_hash(1), "from rip")]);
        let axel = Arc::new(MockSource::new(SourceKind::Axel).without_credentials());
        axel.set_streams(vec![
            candidate(SourceKind::Axel, &test_hash(1), "from axel"),
            candidate(SourceKind::Axel, &test_hash(2), "axel only"),
        ]);

        // registration order does not matter
        let aggregator = Aggregator::new(matrix_metadata(), vec![axel.clone(), rip.clone()]);
        let streams = aggregator
            .resolve(&movie_request(&[SourceKind::Rip, SourceKind::Axel]))
            .await;
        let titles: Vec<_> = streams.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["from rip", "axel only"]);
    }

    #[tokio::test]
    async fn test_failing_source_is_tolerated() {
        let rip = Arc::new(MockSource::new(SourceKind::Rip));
        rip.fail_with("connection reset");
        let axel = Arc::new(MockSource::new(SourceKind::Axel).without_credentials());
        axel.set_streams(vec![candidate(SourceKind::Axel, &test_hash(3), "ok")]);

        let aggregator = Aggregator::new(matrix_metadata(), vec![rip, axel]);
        let streams = aggregator
            .resolve(&movie_request(&[SourceKind::Rip, SourceKind::Axel]))
            .await;
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].title, "ok");
    }

    #[tokio::test]
    async fn test_disabled_sources_are_not_called() {
        let rip = Arc::new(MockSource::new(SourceKind::Rip));
        let axel = Arc::new(MockSource::new(SourceKind::Axel).without_credentials());
        let aggregator = Aggregator::new(matrix_metadata(), vec![rip.clone(), axel.clone()]);

        aggregator.resolve(&movie_request(&[SourceKind::Axel])).await;
        assert!(rip.queries().is_empty());
        assert_eq!(axel.queries(), vec!["tt0133093"]);
    }

    #[tokio::test]
    async fn test_credentials_required() {
        let axel = Arc::new(MockSource::new(SourceKind::Axel));
        axel.set_streams(vec![candidate(SourceKind::Axel, &test_hash(1), "x")]);
        let aggregator = Aggregator::new(matrix_metadata(), vec![axel.clone()]);

        let request = movie_request(&[SourceKind::Axel]);
        assert!(aggregator.resolve(&request).await.is_empty());
        assert!(axel.queries().is_empty());

        let request = request.with_credentials(
            SourceKind::Axel,
            SessionCredentials::new("1", "p").unwrap(),
        );
        assert_eq!(aggregator.resolve(&request).await.len(), 1);
        assert_eq!(axel.last_credentials().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_fallback_queries_while_empty() {
        let rip = Arc::new(MockSource::new(SourceKind::Rip));
        rip.set_streams_for("The Matrix", vec![candidate(SourceKind::Rip, &test_hash(1), "x")]);
        let aggregator = Aggregator::new(matrix_metadata(), vec![rip.clone()]);

        let streams = aggregator.resolve(&movie_request(&[SourceKind::Rip])).await;
        assert_eq!(streams.len(), 1);
        assert_eq!(rip.queries(), vec!["The Matrix 1999", "The Matrix"]);
    }

    #[tokio::test]
    async fn test_series_fallback_to_season_query() {
        let metadata = MockMetadata::new();
        metadata.add("tt0903747", "Breaking Bad", Some(2008));
        let rip = Arc::new(MockSource::new(SourceKind::Rip));
        let aggregator = Aggregator::new(Arc::new(metadata), vec![rip.clone()]);

        let request = StreamRequest::new(ContentType::Series, "tt0903747:2:5")
            .with_sources([SourceKind::Rip]);
        assert!(aggregator.resolve(&request).await.is_empty());
        assert_eq!(rip.queries(), vec!["Breaking Bad S02E05", "Breaking Bad Season 2"]);
        let filter = rip.last_filter().unwrap();
        assert_eq!((filter.season, filter.episode), (Some(2), Some(5)));
    }

    #[tokio::test]
    async fn test_unresolvable_requests_are_empty() {
        let rip = Arc::new(MockSource::new(SourceKind::Rip));
        rip.set_streams(vec![candidate(SourceKind::Rip, &test_hash(1), "x")]);
        let metadata = Arc::new(MockMetadata::new());
        let aggregator = Aggregator::new(metadata.clone(), vec![rip.clone()]);

        // unknown id
        assert!(aggregator.resolve(&movie_request(&[SourceKind::Rip])).await.is_empty());
        // malformed series id
        let request = StreamRequest::new(ContentType::Series, "tt1:x:1").with_sources([SourceKind::Rip]);
        assert!(aggregator.resolve(&request).await.is_empty());
        // metadata failure
        metadata.add("tt0133093", "The Matrix", Some(1999));
        metadata.fail_next();
        assert!(aggregator.resolve(&movie_request(&[SourceKind::Rip])).await.is_empty());

        assert!(rip.queries().is_empty());
    }
}
