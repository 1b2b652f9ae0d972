//! Upload identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum accepted length for an upload id.
const MAX_ID_LEN: usize = 128;

/// Unique identifier for one upload.
///
/// Ids are opaque strings naming every record that belongs to an upload.
/// Because ids are embedded directly into storage paths, the accepted
/// alphabet is restricted to `[A-Za-z0-9_-]`; path separators and traversal
/// sequences cannot be expressed in it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UploadId(String);

impl UploadId {
    /// Generate a new random upload id (UUIDv4, simple form).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse an id supplied by a caller.
    ///
    /// Accepts 1 to 128 characters of `[A-Za-z0-9_-]`. Any id produced by
    /// [`UploadId::generate`] parses; anything that could escape the store's
    /// root directory does not.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() || s.len() > MAX_ID_LEN {
            return Err(crate::Error::InvalidUploadId(format!(
                "length must be 1..={MAX_ID_LEN}, got {}",
                s.len()
            )));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(crate::Error::InvalidUploadId(format!(
                "contains characters outside [A-Za-z0-9_-]: {s:?}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Debug for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UploadId({})", self.0)
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
