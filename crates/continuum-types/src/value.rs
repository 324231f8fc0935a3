use serde::{Deserialize, Serialize};

use crate::error::PayloadError;
use crate::payload::{ENCODING_KEY, Encoding, Payload};

/// The decoded form of a [`Payload`]: what workflow code receives as
/// arguments and returns as its result.
///
/// The converter between the two is total over the three known encodings;
/// anything else is a [`PayloadError`] and aborts the activation rather
/// than reaching workflow code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowValue {
    /// Absence of a value. Encodes as the single `binary/null` payload.
    Null,
    /// Raw bytes (`binary/plain`).
    Binary(Vec<u8>),
    /// A JSON document (`json/plain`).
    Json(serde_json::Value),
}

impl WorkflowValue {
    /// A JSON string value. Convenience for the most common return shape.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Json(serde_json::Value::String(s.into()))
    }

    /// The inner string if this is a JSON string value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The inner bytes if this is a binary value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Encode into the wire payload form.
    pub fn to_payload(&self) -> Result<Payload, PayloadError> {
        match self {
            Self::Null => Ok(Payload::null()),
            Self::Binary(bytes) => Ok(Payload::binary(bytes.clone())),
            Self::Json(value) => Ok(Payload::json_bytes(serde_json::to_vec(value)?)),
        }
    }

    /// Decode a wire payload. Fails closed on missing or unknown encodings.
    pub fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        let Some(declared) = payload.metadata.get(ENCODING_KEY) else {
            return Err(PayloadError::MissingEncoding);
        };
        let Some(encoding) = Encoding::from_bytes(declared) else {
            return Err(PayloadError::UnknownEncoding {
                encoding: String::from_utf8_lossy(declared).into_owned(),
            });
        };
        match encoding {
            Encoding::Null => Ok(Self::Null),
            Encoding::Binary => Ok(Self::Binary(
                payload.data.clone().unwrap_or_default(),
            )),
            Encoding::Json => {
                let data = payload.data.as_deref().unwrap_or_default();
                Ok(Self::Json(serde_json::from_slice(data)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_round_trips_through_the_binary_null_payload() {
        let payload = WorkflowValue::Null.to_payload().unwrap();

        assert_eq!(payload, Payload::null());
        assert_eq!(WorkflowValue::from_payload(&payload).unwrap(), WorkflowValue::Null);
    }

    #[test]
    fn json_string_encodes_with_quotes() {
        let payload = WorkflowValue::text("success").to_payload().unwrap();

        assert_eq!(payload.encoding(), Some(Encoding::Json));
        assert_eq!(payload.data.as_deref(), Some(b"\"success\"".as_slice()));
    }

    #[test]
    fn binary_decodes_to_its_bytes() {
        let value = WorkflowValue::from_payload(&Payload::binary(b"world".to_vec())).unwrap();

        assert_eq!(value.as_bytes(), Some(b"world".as_slice()));
    }

    #[test]
    fn json_document_round_trips() {
        let value = WorkflowValue::Json(json!({"a": [1, 2, 3], "b": "x"}));
        let payload = value.to_payload().unwrap();

        assert_eq!(WorkflowValue::from_payload(&payload).unwrap(), value);
    }

    #[test]
    fn missing_encoding_fails_closed() {
        let payload = Payload {
            metadata: Default::default(),
            data: Some(vec![1]),
        };

        assert!(matches!(
            WorkflowValue::from_payload(&payload),
            Err(PayloadError::MissingEncoding)
        ));
    }

    #[test]
    fn unknown_encoding_reports_the_declared_string() {
        let mut payload = Payload::binary(vec![]);
        payload
            .metadata
            .insert(ENCODING_KEY.to_string(), b"msgpack/plain".to_vec());

        let err = WorkflowValue::from_payload(&payload).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::UnknownEncoding { encoding } if encoding == "msgpack/plain"
        ));
    }

    #[test]
    fn malformed_json_is_a_converter_error() {
        let payload = Payload::json_bytes(b"{not json".to_vec());

        assert!(matches!(
            WorkflowValue::from_payload(&payload),
            Err(PayloadError::Json(_))
        ));
    }
}
