//! Stream candidates and their external (plugin) representation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SourceKind;
use crate::container::ContainerInfo;
use crate::info_hash::InfoHash;
use crate::matcher::Quality;
use crate::source::SearchResult;

const TITLE_DISPLAY_CHARS: usize = 70;

/// Live or listed seeder count. `Unknown` serializes as -1 and is never
/// conflated with a real zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum SeederCount {
    #[default]
    Unknown,
    Known(u32),
}

impl SeederCount {
    pub fn known(&self) -> Option<u32> {
        match self {
            SeederCount::Unknown => None,
            SeederCount::Known(n) => Some(*n),
        }
    }
}

impl From<i64> for SeederCount {
    fn from(value: i64) -> Self {
        u32::try_from(value)
            .map(SeederCount::Known)
            .unwrap_or(SeederCount::Unknown)
    }
}

impl From<SeederCount> for i64 {
    fn from(value: SeederCount) -> Self {
        match value {
            SeederCount::Unknown => -1,
            SeederCount::Known(n) => i64::from(n),
        }
    }
}

impl From<Option<u32>> for SeederCount {
    fn from(value: Option<u32>) -> Self {
        value.map(SeederCount::Known).unwrap_or_default()
    }
}

impl fmt::Display for SeederCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeederCount::Unknown => f.write_str("?"),
            SeederCount::Known(n) => write!(f, "{}", n),
        }
    }
}

/// How a candidate relates to the requested episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateKind {
    /// The release itself is the requested title or episode.
    Single,
    /// One file picked out of a season pack.
    EpisodeFromPack { episode: u32 },
    /// A season pack whose episode file could not be located.
    SeasonPack,
}

/// One playable result, identified by its info hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    pub info_hash: InfoHash,
    /// Raw release title as listed by the source.
    pub title: String,
    pub size: String,
    pub seeders: SeederCount,
    pub source: SourceKind,
    pub source_label: String,
    pub quality: Quality,
    pub trackers: Vec<String>,
    pub file_idx: Option<usize>,
    pub kind: CandidateKind,
    pub bg_audio: bool,
}

impl StreamCandidate {
    /// A single-release candidate from a listing row and its resolved container.
    pub fn from_result(
        source: SourceKind,
        source_label: impl Into<String>,
        result: &SearchResult,
        container: &ContainerInfo,
    ) -> Self {
        Self {
            info_hash: container.info_hash.clone(),
            title: result.title.clone(),
            size: result.size.clone(),
            seeders: result.seeders.into(),
            source,
            source_label: source_label.into(),
            quality: result.quality,
            trackers: container.trackers.clone(),
            file_idx: None,
            kind: CandidateKind::Single,
            bg_audio: result.bg_audio,
        }
    }

    pub fn as_episode_from_pack(mut self, file_idx: usize, episode: u32) -> Self {
        self.file_idx = Some(file_idx);
        self.kind = CandidateKind::EpisodeFromPack { episode };
        self
    }

    pub fn as_season_pack(mut self) -> Self {
        self.file_idx = None;
        self.kind = CandidateKind::SeasonPack;
        self
    }

    fn display_title(&self) -> String {
        let short: String = self.title.chars().take(TITLE_DISPLAY_CHARS).collect();
        let headline = match self.kind {
            CandidateKind::Single => short,
            CandidateKind::EpisodeFromPack { episode } => format!("Ep. {} (from pack)", episode),
            CandidateKind::SeasonPack => format!("📦 Цял сезон\n{}", short),
        };
        format!(
            "{}\n👤 {}\n📁 {}\n🌐 {}",
            headline, self.seeders, self.size, self.source_label
        )
    }

    /// The shape the media player consumes.
    pub fn to_stream(&self) -> Stream {
        let flag = if self.bg_audio { " 🇧🇬" } else { "" };
        Stream {
            name: format!("{}{}\n{}", self.source_label, flag, self.quality),
            title: self.display_title(),
            info_hash: self.info_hash.to_string(),
            sources: self
                .trackers
                .iter()
                .map(|t| format!("tracker:{}", t))
                .collect(),
            file_idx: self.file_idx,
            behavior_hints: BehaviorHints {
                binge_group: format!("{}-{}", self.source, self.quality),
            },
        }
    }
}

/// External stream object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub name: String,
    pub title: String,
    pub info_hash: String,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_idx: Option<usize>,
    pub behavior_hints: BehaviorHints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub binge_group: String,
}

/// Response body of a stream request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamResponse {
    pub streams: Vec<Stream>,
}

impl StreamResponse {
    pub fn from_candidates(candidates: &[StreamCandidate]) -> Self {
        Self {
            streams: candidates.iter().map(StreamCandidate::to_stream).collect(),
        }
    }
}
