use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::info_hash::InfoHash;

static BTIH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)urn:btih:([0-9a-f]{40})").expect("btih regex"));

static MAGNET_IN_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"magnet:\?[^"'<>\s]+"#).expect("magnet regex"));

/// Hash and trackers carried by a magnet link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magnet {
    pub info_hash: InfoHash,
    pub trackers: Vec<String>,
    pub display_name: Option<String>,
}

fn decode_param(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|s| s.into_owned())
        .unwrap_or(value)
}

/// Parse a magnet URI. Only hex `btih` hashes are accepted.
pub fn parse_magnet(uri: &str) -> Option<Magnet> {
    let uri = uri.trim().replace("&amp;", "&");
    let query = uri.strip_prefix("magnet:?")?;

    let info_hash = BTIH
        .captures(query)
        .and_then(|c| c.get(1))
        .and_then(|m| InfoHash::parse(m.as_str()).ok())?;

    let mut trackers = Vec::new();
    let mut display_name = None;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "tr" => {
                let tracker = decode_param(value);
                if !tracker.is_empty() && !trackers.contains(&tracker) {
                    trackers.push(tracker);
                }
            }
            "dn" => display_name = Some(decode_param(value)),
            _ => {}
        }
    }

    Some(Magnet {
        info_hash,
        trackers,
        display_name,
    })
}

/// First magnet link embedded in an HTML page.
pub fn find_magnet(html: &str) -> Option<String> {
    MAGNET_IN_PAGE
        .find(html)
        .map(|m| m.as_str().replace("&amp;", "&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0123456789ABCDEF0123456789ABCDEF01234567";

    #[test]
    fn test_parse_magnet() {
        let uri = format!(
            "magnet:?xt=urn:btih:{}&dn=The+Matrix+1999&tr=udp%3A%2F%2Ftracker.opentrackr.org%3A1337%2Fannounce&amp;tr=http%3A%2F%2Fbt.example.org%2Fannounce",
            HASH
        );
        let magnet = parse_magnet(&uri).unwrap();
        assert_eq!(magnet.info_hash.as_str(), HASH.to_lowercase());
        assert_eq!(
            magnet.trackers,
            vec![
                "udp://tracker.opentrackr.org:1337/announce",
                "http://bt.example.org/announce"
            ]
        );
        assert_eq!(magnet.display_name.as_deref(), Some("The Matrix 1999"));
    }

    #[test]
    fn test_parse_magnet_rejects_bad_input() {
        assert!(parse_magnet("http://example.org").is_none());
        assert!(parse_magnet("magnet:?xt=urn:btih:tooshort").is_none());
        // base32 hashes are not supported
        assert!(parse_magnet("magnet:?xt=urn:btih:MFRGGZDFMZTWQ2LKNNWG23TPOBYXE43U").is_none());
    }

    #[test]
    fn test_find_magnet_in_page() {
        let html = format!(
            r#"<html><a href="magnet:?xt=urn:btih:{}&amp;tr=udp%3A%2F%2Fa">Magnet</a></html>"#,
            HASH
        );
        let found = find_magnet(&html).unwrap();
        assert!(found.starts_with("magnet:?xt=urn:btih:"));
        assert!(found.ends_with("&tr=udp%3A%2F%2Fa"));
        assert!(find_magnet("<html>nothing</html>").is_none());
    }
}
