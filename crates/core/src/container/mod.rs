//! Torrent container parsing: info hash, announce URL and video file list.

mod files;
mod magnet;
mod scan;

pub use files::{extract_video_filenames, VideoFile, VIDEO_EXTENSIONS};
pub use magnet::{find_magnet, parse_magnet, Magnet};
pub use scan::{extract_announce, extract_content_hash, info_span};

use serde::{Deserialize, Serialize};

use crate::info_hash::InfoHash;

/// What a source learned about one torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub info_hash: InfoHash,
    /// Announce URL embedded in the torrent file, if any.
    pub announce: Option<String>,
    /// Every tracker known for this torrent (announce first).
    pub trackers: Vec<String>,
    pub files: Vec<VideoFile>,
}

impl ContainerInfo {
    /// Parse a `.torrent` buffer. `None` when no info hash can be derived.
    pub fn from_torrent_bytes(buf: &[u8]) -> Option<Self> {
        let info_hash = extract_content_hash(buf)?;
        let announce = extract_announce(buf);
        let trackers = announce.iter().cloned().collect();
        Some(Self {
            info_hash,
            announce,
            trackers,
            files: extract_video_filenames(buf),
        })
    }

    /// Build from a magnet link. Magnets carry no file list.
    pub fn from_magnet(uri: &str) -> Option<Self> {
        let magnet = parse_magnet(uri)?;
        Some(Self {
            info_hash: magnet.info_hash,
            announce: magnet.trackers.first().cloned(),
            trackers: magnet.trackers,
            files: Vec::new(),
        })
    }

    /// Append trackers not already present.
    pub fn with_extra_trackers<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tracker in extra {
            let tracker = tracker.into();
            if !self.trackers.contains(&tracker) {
                self.trackers.push(tracker);
            }
        }
        self
    }
}
