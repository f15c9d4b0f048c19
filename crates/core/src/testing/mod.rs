//! Testing utilities and mock implementations.
//!
//! Mocks stand in for every seam the aggregator and sources talk through
//! (metadata, transports, relay, proxy list, prober, sites), so whole
//! request flows can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use bgstreams_core::testing::{fixtures, MockMetadata, MockSource};
//!
//! let metadata = MockMetadata::new();
//! metadata.add("tt0133093", "The Matrix", Some(1999));
//!
//! let rip = MockSource::new(SourceKind::Rip);
//! rip.set_streams(vec![fixtures::candidate(SourceKind::Rip, &fixtures::test_hash(1), "The.Matrix.1999")]);
//! ```

pub mod http;
mod manual_clock;
mod mock_metadata;
mod mock_prober;
mod mock_source;
mod mock_transport;

pub use manual_clock::ManualClock;
pub use mock_metadata::MockMetadata;
pub use mock_prober::MockProber;
pub use mock_source::{MockSite, MockSource};
pub use mock_transport::{MockRelay, MockTransport, StaticProxyList};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::SourceKind;
    use crate::info_hash::InfoHash;
    use crate::source::SearchResult;
    use crate::stream::{CandidateKind, SeederCount, StreamCandidate};

    /// A distinct, valid 40 character hex hash per `n`.
    pub fn test_hash(n: u32) -> String {
        format!("{:08x}", n).repeat(5)
    }

    /// A single-release candidate with unknown quality and seeders.
    pub fn candidate(source: SourceKind, info_hash: &str, title: &str) -> StreamCandidate {
        StreamCandidate {
            info_hash: InfoHash::parse(info_hash).expect("fixture hash"),
            title: title.to_string(),
            size: "1.4 GB".to_string(),
            seeders: SeederCount::Unknown,
            source,
            source_label: source.display_label().to_string(),
            quality: Default::default(),
            trackers: Vec::new(),
            file_idx: None,
            kind: CandidateKind::Single,
            bg_audio: false,
        }
    }

    /// A listing row pointing at `download_ref`.
    pub fn search_result(id: &str, title: &str, seeders: Option<u32>, download_ref: &str) -> SearchResult {
        SearchResult::new(id, title, "1.4 GB", seeders, download_ref)
    }

    /// Builds a bencoded `.torrent` buffer. Keys are emitted in sorted
    /// order, so the info dictionary only depends on name, files and pieces.
    #[derive(Debug, Clone)]
    pub struct TorrentBuilder {
        name: String,
        announce: Option<String>,
        comment: Option<String>,
        files: Vec<(String, u64)>,
        pieces: Vec<u8>,
    }

    impl TorrentBuilder {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                announce: None,
                comment: None,
                files: Vec::new(),
                pieces: vec![0xab; 20],
            }
        }

        pub fn announce(mut self, url: &str) -> Self {
            self.announce = Some(url.to_string());
            self
        }

        pub fn comment(mut self, comment: &str) -> Self {
            self.comment = Some(comment.to_string());
            self
        }

        pub fn file(mut self, name: &str, length: u64) -> Self {
            self.files.push((name.to_string(), length));
            self
        }

        pub fn pieces(mut self, pieces: &[u8]) -> Self {
            self.pieces = pieces.to_vec();
            self
        }

        pub fn build(&self) -> Vec<u8> {
            let mut out = b"d".to_vec();
            if let Some(announce) = &self.announce {
                put_str(&mut out, b"announce");
                put_str(&mut out, announce.as_bytes());
            }
            if let Some(comment) = &self.comment {
                put_str(&mut out, b"comment");
                put_str(&mut out, comment.as_bytes());
            }

            put_str(&mut out, b"info");
            out.push(b'd');
            if self.files.is_empty() {
                put_str(&mut out, b"length");
                put_int(&mut out, 1024);
            } else {
                put_str(&mut out, b"files");
                out.push(b'l');
                for (name, length) in &self.files {
                    out.push(b'd');
                    put_str(&mut out, b"length");
                    put_int(&mut out, *length);
                    put_str(&mut out, b"path");
                    out.push(b'l');
                    put_str(&mut out, name.as_bytes());
                    out.extend_from_slice(b"ee");
                }
                out.push(b'e');
            }
            put_str(&mut out, b"name");
            put_str(&mut out, self.name.as_bytes());
            put_str(&mut out, b"piece length");
            put_int(&mut out, 16384);
            put_str(&mut out, b"pieces");
            put_str(&mut out, &self.pieces);
            out.extend_from_slice(b"ee");
            out
        }
    }

    fn put_str(out: &mut Vec<u8>, s: &[u8]) {
        out.extend_from_slice(s.len().to_string().as_bytes());
        out.push(b':');
        out.extend_from_slice(s);
    }

    fn put_int(out: &mut Vec<u8>, n: u64) {
        out.extend_from_slice(format!("i{}e", n).as_bytes());
    }
}
