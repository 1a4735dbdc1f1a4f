//! Payload serialization.
//!
//! A payload is any JSON object; values may nest arbitrarily. Encoding and
//! decoding go through serde_json.

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::forward::ForwardError;

/// Schemaless key-value payload relayed between tiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(pub Map<String, Value>);

impl Payload {
    /// Encode to JSON bytes.
    pub fn encode(&self) -> Result<Bytes, ForwardError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(ForwardError::Serialization)
    }

    /// Decode JSON bytes. Anything other than a JSON object is rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, ForwardError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ForwardError::Decode(format!("error unmarshalling request body: {e}")))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_nested() {
        let payload = Payload::decode(br#"{"key": 42, "inner": {"list": [1, "two", null]}}"#).unwrap();
        assert_eq!(payload.get("key"), Some(&json!(42)));
        assert_eq!(payload.get("inner"), Some(&json!({"list": [1, "two", null]})));
    }

    #[test]
    fn test_encode_is_compact_json() {
        let mut payload = Payload::default();
        payload.insert("key", 42);
        assert_eq!(payload.encode().unwrap(), Bytes::from_static(br#"{"key":42}"#));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for input in [&b"{\"key\": 4"[..], b"not json", b"", b"[1, 2]", b"42"] {
            let err = Payload::decode(input).unwrap_err();
            assert!(matches!(err, ForwardError::Decode(_)), "accepted {input:?}");
        }
    }
}
