use bytes::Bytes;
use futures::stream;
use sha1::{Digest, Sha1};
use tusk_store::DataStream;

/// Compute the SHA-1 digest of data.
pub fn sha1_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Wrap one payload as a single-chunk data stream.
pub fn one_chunk_stream(data: impl Into<Bytes>) -> DataStream {
    let chunks: Vec<std::io::Result<Bytes>> = vec![Ok(data.into())];
    Box::pin(stream::iter(chunks))
}

/// Split a payload into fixed-size chunks and stream them.
pub fn chunked_stream(data: Bytes, chunk_size: usize) -> DataStream {
    let chunks: Vec<std::io::Result<Bytes>> = (0..data.len())
        .step_by(chunk_size)
        .map(|start| Ok(data.slice(start..data.len().min(start + chunk_size))))
        .collect();
    Box::pin(stream::iter(chunks))
}

/// Generate deterministic test data using a seeded pseudo-random generator.
/// Same seed produces same output (reproducible tests).
pub fn seeded_bytes(seed: u64, len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    let mut state = seed;

    // Simple LCG (Linear Congruential Generator)
    for chunk in data.chunks_mut(8) {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_bytes_deterministic() {
        assert_eq!(seeded_bytes(42, 1000), seeded_bytes(42, 1000));
        assert_ne!(seeded_bytes(42, 1000), seeded_bytes(43, 1000));
    }

    #[test]
    fn test_sha1_digest_known_vector() {
        // SHA-1 of "abc"
        assert_eq!(
            sha1_digest(b"abc"),
            [
                0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78,
                0x50, 0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d
            ]
        );
    }
}
