//! Checksum algorithms for chunk verification.

use sha1::{Digest, Sha1};
use std::fmt;

/// Names of the checksum algorithms the store supports, in advertisement
/// order.
pub const SUPPORTED_CHECKSUM_ALGORITHMS: &[&str] = &["sha1"];

/// A checksum algorithm the store can verify chunks with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// SHA-1, the algorithm the tus checksum extension names by default.
    Sha1,
}

impl ChecksumAlgorithm {
    /// Resolve an algorithm by its advertised name.
    pub fn parse(name: &str) -> crate::Result<Self> {
        match name {
            "sha1" => Ok(Self::Sha1),
            other => Err(crate::Error::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// The advertised name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
        }
    }

    /// Create an incremental digester for this algorithm.
    pub fn digester(&self) -> ChunkDigester {
        match self {
            Self::Sha1 => ChunkDigester(Sha1::new()),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Incremental digest over one chunk's bytes.
pub struct ChunkDigester(Sha1);

impl ChunkDigester {
    /// Update the digester with data.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Finalize and return the digest bytes.
    pub fn finalize(self) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn test_registry_advertises_sha1() {
        assert_eq!(SUPPORTED_CHECKSUM_ALGORITHMS, &["sha1"]);
        assert_eq!(ChecksumAlgorithm::parse("sha1").unwrap(), ChecksumAlgorithm::Sha1);
        assert_eq!(ChecksumAlgorithm::Sha1.name(), "sha1");
        assert_eq!(ChecksumAlgorithm::Sha1.digest_len(), 20);
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        assert!(matches!(
            ChecksumAlgorithm::parse("md5"),
            Err(crate::Error::UnsupportedAlgorithm(name)) if name == "md5"
        ));
    }

    #[test]
    fn test_sha1_digest_matches_known_vector() {
        let mut digester = ChecksumAlgorithm::Sha1.digester();
        digester.update("Hello World 12345!!@@åäö".as_bytes());
        assert_eq!(
            digester.finalize(),
            STANDARD.decode("9jSJuBxGMnq4UffwNYM8ct1tYQQ=").unwrap()
        );
    }

    #[test]
    fn test_incremental_updates_match_single_update() {
        let mut split = ChecksumAlgorithm::Sha1.digester();
        split.update(b"hello ");
        split.update(b"world");
        let mut whole = ChecksumAlgorithm::Sha1.digester();
        whole.update(b"hello world");
        assert_eq!(split.finalize(), whole.finalize());
    }
}
