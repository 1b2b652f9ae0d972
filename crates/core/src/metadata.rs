//! Upload metadata and its wire codec.
//!
//! The wire format is the tus `Upload-Metadata` shape: entries separated by
//! commas, key and base64-encoded value within an entry separated by one
//! space: `key1 base64(value1),key2 base64(value2)`. Keys are literal text;
//! values are opaque bytes. A key may appear without a value, which decodes
//! to an empty byte value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;

/// Decoded upload metadata: an ordered mapping of key to raw byte value.
///
/// Keys are case-sensitive and unique. The mapping is ordered so that
/// encoding is deterministic. "No metadata" is represented as the absence of
/// a mapping, not as an empty one; [`UploadMetadata::parse`] returns
/// `Ok(None)` for empty input and [`UploadMetadata::encode`] returns `None`
/// for an empty mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadMetadata(BTreeMap<String, Vec<u8>>);

impl UploadMetadata {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the wire form.
    ///
    /// Returns `Ok(None)` for empty input: "no metadata" is a distinct state
    /// from an empty mapping. Rejects entries with empty or duplicate keys
    /// and values that are not valid base64.
    pub fn parse(text: &str) -> crate::Result<Option<Self>> {
        if text.is_empty() {
            return Ok(None);
        }
        let mut entries = BTreeMap::new();
        for entry in text.split(',') {
            let mut parts = entry.splitn(2, ' ');
            let key = parts.next().unwrap_or_default();
            if key.is_empty() {
                return Err(crate::Error::InvalidMetadata(
                    "entry with empty key".to_string(),
                ));
            }
            let value = match parts.next() {
                Some(encoded) => STANDARD.decode(encoded).map_err(|e| {
                    crate::Error::InvalidMetadata(format!(
                        "value for key {key:?} is not valid base64: {e}"
                    ))
                })?,
                None => Vec::new(),
            };
            if entries.insert(key.to_string(), value).is_some() {
                return Err(crate::Error::InvalidMetadata(format!(
                    "duplicate key {key:?}"
                )));
            }
        }
        Ok(Some(Self(entries)))
    }

    /// Encode to the wire form, or `None` if the mapping is empty.
    pub fn encode(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(
            self.0
                .iter()
                .map(|(key, value)| format!("{key} {}", STANDARD.encode(value)))
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Insert an entry, validating that the key is expressible on the wire.
    pub fn insert(&mut self, key: impl Into<String>, value: Vec<u8>) -> crate::Result<()> {
        let key = key.into();
        if key.is_empty() || key.contains(' ') || key.contains(',') {
            return Err(crate::Error::InvalidMetadata(format!(
                "key {key:?} must be non-empty and contain no spaces or commas"
            )));
        }
        self.0.insert(key, value);
        Ok(())
    }

    /// Look up the value for a key.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Whether the mapping contains a key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_base64_values_byte_accurately() {
        // "¶ÀĚŧ̳" as UTF-8, base64-encoded.
        let metadata = UploadMetadata::parse("key wrbDgMSaxafMsw==")
            .unwrap()
            .unwrap();
        assert_eq!(
            metadata.get("key").unwrap(),
            &[194, 182, 195, 128, 196, 154, 197, 167, 204, 179]
        );
        assert_eq!(
            String::from_utf8(metadata.get("key").unwrap().to_vec()).unwrap(),
            "¶ÀĚŧ̳"
        );
    }

    #[test]
    fn test_empty_input_is_no_metadata() {
        assert_eq!(UploadMetadata::parse("").unwrap(), None);
    }

    #[test]
    fn test_roundtrip_is_lossless() {
        let text = "filename aGVsbG8udHh0,mime dGV4dC9wbGFpbg==";
        let metadata = UploadMetadata::parse(text).unwrap().unwrap();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.encode().unwrap(), text);
    }

    #[test]
    fn test_key_without_value_decodes_to_empty_bytes() {
        let metadata = UploadMetadata::parse("flag").unwrap().unwrap();
        assert_eq!(metadata.get("flag").unwrap(), b"");
    }

    #[test]
    fn test_rejects_malformed_entries() {
        assert!(UploadMetadata::parse(" aGk=").is_err());
        assert!(UploadMetadata::parse("key not$base64").is_err());
        assert!(UploadMetadata::parse("key aGk=,key aGk=").is_err());
    }

    #[test]
    fn test_insert_validates_keys() {
        let mut metadata = UploadMetadata::new();
        metadata.insert("name", b"x".to_vec()).unwrap();
        assert!(metadata.insert("bad key", Vec::new()).is_err());
        assert!(metadata.insert("bad,key", Vec::new()).is_err());
        assert!(metadata.insert("", Vec::new()).is_err());
    }

    #[test]
    fn test_encode_empty_mapping_is_none() {
        assert_eq!(UploadMetadata::new().encode(), None);
    }
}
