//! Release-name normalization and disambiguation.

mod episode;
mod filter;
mod normalize;
mod quality;

pub use episode::{find_episode_file_idx, is_season_pack};
pub use filter::{extract_seasons, extract_years, matches_filter, TitleFilter, EDITION_WORDS};
pub use normalize::{extract_title_part, normalize};
pub use quality::Quality;
