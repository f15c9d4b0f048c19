use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::normalize::{extract_title_part, normalize};

/// Words that may follow the title without making it a different work.
pub const EDITION_WORDS: &[&str] = &[
    "extended", "unrated", "directors", "director", "cut", "remastered",
    "special", "edition", "complete", "theatrical", "imax", "dc",
    "recut", "final", "ultimate", "criterion", "restored", "redux",
    "anniversary", "collectors", "limited", "deluxe", "premium",
    "dubbed", "subbed", "dual", "multi", "bg", "bgaudio", "bgsub",
    "audio", "subs", "subtitle", "subtitles", "aka", "repack", "proper",
    "hybrid", "open", "matte", "bonus", "extras", "uncensored",
    "part", "vol", "volume", "season",
];

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year regex"));

static SEASON_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bs(\d{1,2})(?:e\d{1,3})?\b").expect("season tag regex"));

static SEASON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bseason\s+(\d+)").expect("season word regex"));

/// What the caller asked for, resolved from the content id and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TitleFilter {
    pub name: String,
    pub year: Option<u16>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl TitleFilter {
    pub fn movie(name: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            name: name.into(),
            year,
            season: None,
            episode: None,
        }
    }

    pub fn episode(name: impl Into<String>, year: Option<u16>, season: u32, episode: u32) -> Self {
        Self {
            name: name.into(),
            year,
            season: Some(season),
            episode: Some(episode),
        }
    }

    fn allows_extra_word(&self, word: &str) -> bool {
        if EDITION_WORDS.contains(&word) {
            return true;
        }
        self.season.is_some()
            && (word == "season"
                || (word.len() <= 2 && !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit())))
    }

    fn title_part_matches(&self, title_part: &str, name: &str) -> bool {
        let Some(extra) = title_part.strip_prefix(name) else {
            return false;
        };
        // "soul" must not match "soulmates"
        if !extra.is_empty() && !extra.starts_with(' ') {
            return false;
        }
        extra.split_whitespace().all(|w| self.allows_extra_word(w))
    }

    /// Whether a release title plausibly is the requested work.
    pub fn matches(&self, title: &str) -> bool {
        let norm_name = normalize(&self.name);
        if norm_name.is_empty() {
            return true;
        }
        let title_part = extract_title_part(title);

        let matched = self.title_part_matches(&title_part, &norm_name) || {
            let name_no_the = norm_name.strip_prefix("the ").unwrap_or(&norm_name);
            let title_no_the = title_part.strip_prefix("the ").unwrap_or(&title_part);
            self.title_part_matches(title_no_the, name_no_the)
        };
        if !matched {
            debug!(title = %title, expected = %norm_name, "Skipping: title mismatch");
            return false;
        }
        self.matches_details(title)
    }

    /// Year and season checks only. Used for exact id searches, whose
    /// release names may not carry the canonical title at all.
    pub fn matches_details(&self, title: &str) -> bool {
        if let Some(year) = self.year {
            let years = extract_years(title);
            if !years.is_empty() && !years.contains(&year) {
                debug!(title = %title, expected = year, "Skipping: year mismatch");
                return false;
            }
        }

        if let Some(season) = self.season {
            let seasons = extract_seasons(title);
            if !seasons.is_empty() && !seasons.contains(&season) {
                debug!(title = %title, expected = season, "Skipping: season mismatch");
                return false;
            }
        }

        true
    }
}

/// Four digit years (1900-2099) present in the raw title.
pub fn extract_years(title: &str) -> Vec<u16> {
    YEAR.captures_iter(title)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect()
}

/// Season numbers from `S<nn>`/`S<nn>E<nn>` tags, else from "season N".
pub fn extract_seasons(title: &str) -> Vec<u32> {
    let norm = normalize(title);
    let tagged: Vec<u32> = SEASON_TAG
        .captures_iter(&norm)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect();
    if !tagged.is_empty() {
        return tagged;
    }
    SEASON_WORD
        .captures_iter(&norm)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect()
}

/// Free-function form of [`TitleFilter::matches`].
pub fn matches_filter(title: &str, filter: &TitleFilter) -> bool {
    filter.matches(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_title_and_year() {
        let filter = TitleFilter::movie("Soul", Some(2020));
        assert!(matches_filter("Soul.2020.1080p.BluRay", &filter));
        assert!(!matches_filter("Soul.Surfer.2011.720p", &filter));
        assert!(!matches_filter("Soul.2019.1080p", &filter));
    }

    #[test]
    fn test_leading_article_is_optional() {
        let filter = TitleFilter::movie("Matrix", Some(1999));
        assert!(matches_filter("The.Matrix.1999.WEB", &filter));

        let filter = TitleFilter::movie("The Matrix", Some(1999));
        assert!(matches_filter("Matrix 1999 720p", &filter));
        assert!(matches_filter("The.Matrix.1999.1080p.BluRay", &filter));
        assert!(!matches_filter("The.Matrix.Reloaded.2003.1080p", &filter));
    }

    #[test]
    fn test_edition_words_allowed() {
        let filter = TitleFilter::movie("Blade Runner", Some(1982));
        assert!(matches_filter("Blade.Runner.Final.Cut.1982.1080p", &filter));
        assert!(matches_filter("Blade Runner (Directors Cut) BG Audio", &filter));
        assert!(!matches_filter("Blade.Runner.2049.2017.1080p", &filter));
    }

    #[test]
    fn test_prefix_must_end_on_word() {
        let filter = TitleFilter::movie("Soul", None);
        assert!(!matches_filter("Soulmates.2020.1080p", &filter));
    }

    #[test]
    fn test_missing_year_gives_benefit_of_doubt() {
        let filter = TitleFilter::movie("Inception", Some(2010));
        assert!(matches_filter("Inception.1080p.BluRay.x264", &filter));
        assert!(matches_filter("Inception.2010.Remastered.2020.1080p", &filter));
    }

    #[test]
    fn test_season_checks() {
        let filter = TitleFilter::episode("Dark", Some(2017), 2, 5);
        assert!(matches_filter("Dark.S02.1080p.NF.WEB-DL", &filter));
        assert!(matches_filter("Dark.S02E05.720p", &filter));
        assert!(matches_filter("Dark Season 2 Complete", &filter));
        assert!(matches_filter("Dark.2017.1080p", &filter));
        assert!(!matches_filter("Dark.S03.1080p", &filter));
        assert!(!matches_filter("Dark.S01E05.720p", &filter));
        assert!(!matches_filter("Dark Season 3", &filter));
    }

    #[test]
    fn test_season_extra_words_with_season_filter() {
        let filter = TitleFilter::episode("Chernobyl", None, 1, 1);
        // "1" and "season" only pass when a season was requested
        assert!(filter.allows_extra_word("1"));
        assert!(filter.allows_extra_word("season"));
        assert!(!TitleFilter::movie("Chernobyl", None).allows_extra_word("1"));
    }

    #[test]
    fn test_cyrillic_titles() {
        let filter = TitleFilter::movie("Под игото", Some(1952));
        assert!(matches_filter("Под игото (1952) DVDRip", &filter));
        assert!(!matches_filter("Под игото 2 (1990)", &filter));
    }

    #[test]
    fn test_empty_name_matches_everything() {
        let filter = TitleFilter::default();
        assert!(matches_filter("Anything.2020", &filter));
    }

    #[test]
    fn test_extract_years_and_seasons() {
        assert_eq!(extract_years("Movie 1999 remaster 2020"), vec![1999, 2020]);
        assert!(extract_years("Movie 2160p").is_empty());
        assert_eq!(extract_seasons("Show.S01-S03.Complete"), vec![1, 3]);
        assert_eq!(extract_seasons("Show Season 4"), vec![4]);
        assert!(extract_seasons("Show.2019").is_empty());
    }

    #[test]
    fn test_details_ignore_title() {
        let filter = TitleFilter::episode("Breaking Bad", Some(2008), 2, 5);
        assert!(filter.matches_details("В обувките на Сатаната S02E05"));
        assert!(filter.matches_details("Breaking.Bad.2008.Season.2"));
        assert!(!filter.matches_details("Breaking.Bad.S01E05.720p"));
        assert!(!filter.matches_details("Breaking.Bad.S02.2013.Remux"));
        assert!(!filter.matches("Pokazat.S02E05"));
    }

    #[test]
    fn test_episode_tag_counts_as_season_marker() {
        let filter = TitleFilter::episode("Dark", None, 1, 3);
        assert!(matches_filter("Dark.S01E03.1080p", &filter));
        assert!(matches_filter("Dark S01E07 720p", &filter));
        assert!(!matches_filter("Dark.S02E03.1080p", &filter));
        assert_eq!(extract_seasons("dark s01e03"), vec![1]);
        assert_eq!(extract_title_part("Dark.S01E03.1080p"), "dark");
    }
}
