use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key under which a payload declares its encoding.
pub const ENCODING_KEY: &str = "encoding";

/// Wire encoding of a payload's `data` bytes.
///
/// The converter on both sides of the worker boundary dispatches on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// No value; `data` is absent.
    Null,
    /// Raw bytes in `data`.
    Binary,
    /// UTF-8 JSON in `data`.
    Json,
}

impl Encoding {
    /// The wire string stored under [`ENCODING_KEY`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "binary/null",
            Self::Binary => "binary/plain",
            Self::Json => "json/plain",
        }
    }

    /// Parse the metadata bytes back into a known encoding.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"binary/null" => Some(Self::Null),
            b"binary/plain" => Some(Self::Binary),
            b"json/plain" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque user datum crossing the worker boundary.
///
/// The metadata map carries at minimum the encoding declaration; `data` is
/// absent exactly for `binary/null`. Payloads are constructed by the
/// converter and never mutated downstream. The map is ordered so that
/// re-encoding a payload is byte-stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub metadata: BTreeMap<String, Vec<u8>>,
    pub data: Option<Vec<u8>>,
}

impl Payload {
    fn with_encoding(encoding: Encoding, data: Option<Vec<u8>>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(ENCODING_KEY.to_string(), encoding.as_str().as_bytes().to_vec());
        Self { metadata, data }
    }

    /// The single-payload form of "no value" (`binary/null`, no data).
    pub fn null() -> Self {
        Self::with_encoding(Encoding::Null, None)
    }

    /// Raw bytes under `binary/plain`.
    pub fn binary(data: Vec<u8>) -> Self {
        Self::with_encoding(Encoding::Binary, Some(data))
    }

    /// Pre-encoded UTF-8 JSON under `json/plain`.
    pub fn json_bytes(data: Vec<u8>) -> Self {
        Self::with_encoding(Encoding::Json, Some(data))
    }

    /// The declared encoding, if present and known.
    pub fn encoding(&self) -> Option<Encoding> {
        self.metadata
            .get(ENCODING_KEY)
            .and_then(|bytes| Encoding::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_payload_declares_encoding_and_carries_no_data() {
        let payload = Payload::null();

        assert_eq!(payload.encoding(), Some(Encoding::Null));
        assert_eq!(payload.data, None);
        assert_eq!(
            payload.metadata.get(ENCODING_KEY),
            Some(&b"binary/null".to_vec())
        );
    }

    #[test]
    fn binary_and_json_payloads_carry_their_data() {
        let binary = Payload::binary(b"world".to_vec());
        let json = Payload::json_bytes(b"\"Hello\"".to_vec());

        assert_eq!(binary.encoding(), Some(Encoding::Binary));
        assert_eq!(binary.data.as_deref(), Some(b"world".as_slice()));
        assert_eq!(json.encoding(), Some(Encoding::Json));
        assert_eq!(json.data.as_deref(), Some(b"\"Hello\"".as_slice()));
    }

    #[test]
    fn unknown_or_missing_encoding_reads_as_none() {
        let mut payload = Payload::binary(vec![1, 2, 3]);
        payload
            .metadata
            .insert(ENCODING_KEY.to_string(), b"msgpack/plain".to_vec());
        assert_eq!(payload.encoding(), None);

        payload.metadata.remove(ENCODING_KEY);
        assert_eq!(payload.encoding(), None);
    }
}
