use once_cell::sync::Lazy;
use regex_lite::Regex;

/// First token that ends the title portion of a release name.
static TITLE_END_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:(?:19|20)\d{2}|2160p|1080[pi]|720p|480p|360p|4k|uhd|bluray|blu ray|bdrip|bdremux",
        r"|webrip|web[\s-]?dl|webdl|hdtv|pdtv|dvdrip|hdrip|hdcam|telesync|remux",
        r"|x264|x265|h\s?264|h\s?265|hevc|avc|aac|dts|ac3",
        r"|s\d{1,2}(?:e\d{1,3})?|season\s+\d|complete|multi)\b"
    ))
    .expect("title marker regex")
});

fn is_kept_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() || ('\u{0400}'..='\u{04FF}').contains(&c)
}

/// Lowercase, replace punctuation with spaces, collapse whitespace.
///
/// ASCII word characters and Cyrillic letters survive; everything else
/// (dots, dashes, brackets, other scripts) becomes a separator.
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_kept_char(c) { c } else { ' ' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The presumed title: the normalized text before the first year, quality,
/// codec or season marker.
pub fn extract_title_part(title: &str) -> String {
    let norm = normalize(title);
    match TITLE_END_MARKER.find(&norm) {
        Some(m) => norm[..m.start()].trim().to_string(),
        None => norm,
    }
}
