//! JSON codec using `serde_json`.
//!
//! Every frame payload on the channel is UTF-8 JSON. Inbound payloads are
//! always objects at the top level.
//!
//! # Example
//!
//! ```
//! use presence_ipc::codec::JsonCodec;
//!
//! let encoded = JsonCodec::encode(&serde_json::json!({ "v": 1 })).unwrap();
//! assert_eq!(encoded, br#"{"v":1}"#);
//!
//! let map = JsonCodec::decode_object(&encoded).unwrap();
//! assert_eq!(map["v"], 1);
//! ```

use serde_json::{Map, Value};

use crate::error::{IpcError, Result};

/// JSON codec for frame payloads.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    /// Decode JSON bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode a payload that must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::Protocol`] for malformed JSON or a non-object
    /// top-level value.
    pub fn decode_object(bytes: &[u8]) -> Result<Map<String, Value>> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(IpcError::Protocol(format!(
                "expected JSON object payload, got {}",
                kind(&other)
            ))),
            Err(e) => Err(IpcError::Protocol(format!("malformed JSON payload: {}", e))),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
