use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A video file found inside a container, with its discovery position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    pub name: String,
    pub index: usize,
}

// Runs over a one-char-per-byte view of the buffer, so UTF-8 encoded
// Cyrillic shows up as chars in U+0080..U+00FF.
static VIDEO_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\w.\-\s\x{80}-\x{FF}]{3,150}\.(?:mkv|mp4|avi|wmv|flv|mov|m4v|ts|webm)")
        .expect("video filename regex")
});

pub const VIDEO_EXTENSIONS: [&str; 9] = ["mkv", "mp4", "avi", "wmv", "flv", "mov", "m4v", "ts", "webm"];

/// Heuristic scan of raw container bytes for video file names.
///
/// Names are deduplicated case-insensitively and indexed in the order they
/// were found.
pub fn extract_video_filenames(buf: &[u8]) -> Vec<VideoFile> {
    let latin1: String = buf.iter().map(|&b| b as char).collect();
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for m in VIDEO_NAME.find_iter(&latin1) {
        let raw: Vec<u8> = m.as_str().chars().map(|c| c as u32 as u8).collect();
        let name = String::from_utf8_lossy(&raw).trim().to_string();
        if seen.insert(name.to_lowercase()) {
            files.push(VideoFile {
                name,
                index: files.len(),
            });
        }
    }

    files
}
