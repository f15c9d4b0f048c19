//! Byte-level scanning of bencoded torrent files.
//!
//! Only the pieces needed for streaming are pulled out: the info hash and the
//! primary announce URL. Anything malformed yields `None`.

use sha1::{Digest, Sha1};

use crate::info_hash::InfoHash;

const INFO_MARKER: &[u8] = b"4:infod";
const ANNOUNCE_MARKER: &[u8] = b"8:announce";

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Locate the byte span of the `info` dictionary, including its `d`/`e`.
pub fn info_span(buf: &[u8]) -> Option<&[u8]> {
    let start = find(buf, INFO_MARKER)? + INFO_MARKER.len() - 1;
    let mut depth: usize = 0;
    let mut pos = start;

    while pos < buf.len() {
        match buf[pos] {
            b'd' | b'l' => {
                depth += 1;
                pos += 1;
            }
            b'e' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&buf[start..=pos]);
                }
                pos += 1;
            }
            b'i' => {
                // integer: skip to the terminating 'e'
                let end = buf[pos..].iter().position(|&b| b == b'e')?;
                pos += end + 1;
            }
            b'0'..=b'9' => {
                let colon = buf[pos..].iter().position(|&b| b == b':')?;
                let len: usize = std::str::from_utf8(&buf[pos..pos + colon])
                    .ok()?
                    .parse()
                    .ok()?;
                pos = pos.checked_add(colon + 1)?.checked_add(len)?;
            }
            _ => pos += 1,
        }
    }

    None
}

/// SHA-1 over the `info` dictionary span.
pub fn extract_content_hash(buf: &[u8]) -> Option<InfoHash> {
    let span = info_span(buf)?;
    let digest: [u8; 20] = Sha1::digest(span).into();
    Some(InfoHash::from_digest(digest))
}

/// The `announce` string, returned verbatim.
pub fn extract_announce(buf: &[u8]) -> Option<String> {
    let marker = find(buf, ANNOUNCE_MARKER)?;
    let digits_start = marker + ANNOUNCE_MARKER.len();
    let rest = buf.get(digits_start..)?;

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || rest.get(digits) != Some(&b':') {
        return None;
    }
    let len: usize = std::str::from_utf8(&rest[..digits]).ok()?.parse().ok()?;
    let value_start = digits + 1;
    let value = rest.get(value_start..value_start.checked_add(len)?)?;

    Some(String::from_utf8_lossy(value).into_owned())
}
