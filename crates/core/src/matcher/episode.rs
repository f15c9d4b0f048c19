use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::normalize::normalize;
use crate::container::VideoFile;

static SEASON_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bs\d{1,2}\b").expect("season regex"));

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bs\d{1,2}e\d{1,3}\b").expect("episode regex"));

static PACK_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:season\s+\d|complete)\b").expect("pack regex"));

/// A season tag without an episode tag, or "season N"/"complete".
pub fn is_season_pack(title: &str) -> bool {
    let norm = normalize(title);
    let season_only = SEASON_ONLY.is_match(&norm) && !SEASON_EPISODE.is_match(&norm);
    season_only || PACK_WORDS.is_match(&norm)
}

/// Pick the file for one episode out of a pack's file list.
///
/// Tries an exact `SxxEyy` tag, then a bare `Eyy` or "episode N", then
/// falls back to the Nth file in name order.
pub fn find_episode_file_idx(files: &[VideoFile], season: u32, episode: u32) -> Option<usize> {
    if files.is_empty() {
        return None;
    }

    let exact = format!("s{:02}e{:02}", season, episode);
    if let Some(file) = files.iter().find(|f| f.name.to_lowercase().contains(&exact)) {
        return Some(file.index);
    }

    let loose = Regex::new(&format!(
        r"\be0*{ep}\b|\bepisode\s*0*{ep}\b",
        ep = episode
    ))
    .ok()?;
    if let Some(file) = files.iter().find(|f| loose.is_match(&f.name.to_lowercase())) {
        return Some(file.index);
    }

    let position = usize::try_from(episode).ok()?.checked_sub(1)?;
    let mut sorted: Vec<&VideoFile> = files.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted.get(position).map(|f| f.index)
}
