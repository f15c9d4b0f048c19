use serde::{Deserialize, Serialize};

use super::ContentRequest;
use crate::matcher::normalize;

/// How a source wants to be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStyle {
    /// The site indexes IMDB ids; search by the canonical id.
    ContentId,
    /// Free-text title search.
    Title,
}

/// Strip punctuation from a search string, keeping case and Cyrillic.
pub fn sanitize_query(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric()
                || c == '_'
                || c.is_whitespace()
                || ('\u{0400}'..='\u{04FF}').contains(&c)
            {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// "S01E05"
pub fn format_episode(season: u32, episode: u32) -> String {
    format!("S{:02}E{:02}", season, episode)
}

/// Primary query followed by fallbacks tried while results stay empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    queries: Vec<String>,
}

impl QueryPlan {
    pub fn build(style: QueryStyle, request: &ContentRequest, name: &str, year: Option<u16>) -> Self {
        if style == QueryStyle::ContentId {
            return Self {
                queries: vec![request.imdb_id.clone()],
            };
        }

        let mut queries = Vec::new();
        match (request.season, request.episode) {
            (Some(season), Some(episode)) => {
                queries.push(format!("{} {}", name, format_episode(season, episode)));
                queries.push(format!("{} Season {}", name, season));
            }
            _ => {
                match year {
                    Some(year) => queries.push(format!("{} {}", name, year)),
                    None => queries.push(name.to_string()),
                }
                queries.push(name.to_string());
            }
        }

        let mut plan: Vec<String> = Vec::new();
        for query in queries.iter().map(|q| sanitize_query(q)) {
            if !query.is_empty() && !plan.iter().any(|q| normalize(q) == normalize(&query)) {
                plan.push(query);
            }
        }
        Self { queries: plan }
    }

    pub fn primary(&self) -> Option<&str> {
        self.queries.first().map(String::as_str)
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }
}
