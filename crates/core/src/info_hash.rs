use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when a string is not a 40 character hex digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid info hash: {0:?}")]
pub struct InvalidInfoHash(pub String);

/// Content hash identifying a torrent: 40 lowercase hex characters.
///
/// Construction always validates, so every value held by the rest of the
/// crate is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InfoHash(String);

impl InfoHash {
    /// Parse a hex digest, accepting either case.
    pub fn parse(s: &str) -> Result<Self, InvalidInfoHash> {
        let s = s.trim();
        if s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(InvalidInfoHash(s.to_string()))
        }
    }

    pub fn from_digest(digest: [u8; 20]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 20 byte form used on the wire by tracker protocols.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        // Validated on construction, decoding cannot fail.
        if hex::decode_to_slice(&self.0, &mut out).is_err() {
            out = [0u8; 20];
        }
        out
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InfoHash {
    type Error = InvalidInfoHash;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InfoHash> for String {
    fn from(hash: InfoHash) -> Self {
        hash.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercases() {
        let hash = InfoHash::parse("ABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
        assert_eq!(hash.as_str(), "abcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(InfoHash::parse("").is_err());
        assert!(InfoHash::parse("abc").is_err());
        assert!(InfoHash::parse("zzcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(InfoHash::parse("abcdef0123456789abcdef0123456789abcdef012").is_err());
    }

    #[test]
    fn test_bytes_round_trip() {
        let digest = [0xab; 20];
        let hash = InfoHash::from_digest(digest);
        assert_eq!(hash.as_str(), "ab".repeat(20));
        assert_eq!(hash.to_bytes(), digest);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<InfoHash, _> =
            serde_json::from_str("\"0123456789abcdef0123456789abcdef01234567\"");
        assert!(ok.is_ok());
        let bad: Result<InfoHash, _> = serde_json::from_str("\"nothex\"");
        assert!(bad.is_err());
    }
}
