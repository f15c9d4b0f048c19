use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse quality tag derived from a release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "4K")]
    Uhd4k,
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "480p")]
    Sd480,
    BluRay,
    #[serde(rename = "WEB")]
    Web,
    #[serde(rename = "HDTV")]
    Hdtv,
    #[serde(rename = "DVDRip")]
    DvdRip,
    #[default]
    Unknown,
}

impl Quality {
    /// Tag detection; earlier checks win.
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        let has = |needle: &str| lower.contains(needle);

        if has("2160p") || has("4k") || has("uhd") {
            Quality::Uhd4k
        } else if has("1080p") {
            Quality::Hd1080
        } else if has("720p") {
            Quality::Hd720
        } else if has("480p") {
            Quality::Sd480
        } else if has("dvdrip") {
            Quality::DvdRip
        } else if has("hdtv") {
            Quality::Hdtv
        } else if has("webrip") || has("web-dl") {
            Quality::Web
        } else if has("bdrip") || has("bluray") || has("blu-ray") {
            Quality::BluRay
        } else {
            Quality::Unknown
        }
    }

    /// Sort key, higher is better.
    pub fn rank(&self) -> u8 {
        match self {
            Quality::Uhd4k => 6,
            Quality::Hd1080 => 5,
            Quality::BluRay => 4,
            Quality::Hd720 | Quality::Web => 3,
            Quality::Hdtv => 2,
            Quality::DvdRip | Quality::Sd480 => 1,
            Quality::Unknown => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Uhd4k => "4K",
            Quality::Hd1080 => "1080p",
            Quality::Hd720 => "720p",
            Quality::Sd480 => "480p",
            Quality::BluRay => "BluRay",
            Quality::Web => "WEB",
            Quality::Hdtv => "HDTV",
            Quality::DvdRip => "DVDRip",
            Quality::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
