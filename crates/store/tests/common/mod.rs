pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{chunked_stream, one_chunk_stream, seeded_bytes, sha1_digest};
