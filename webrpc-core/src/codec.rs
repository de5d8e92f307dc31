//! Codec for JSON-RPC frame serialization and deserialization
//!
//! Thin wrappers over serde that map failures to the right error class:
//! invalid inbound JSON becomes a parse error (-32700), un-encodable
//! outbound values become `Error::Serialization`.
//!
//! The daemon protocol is single-frame; JSON-RPC batch arrays are not part
//! of it and are rejected on decode.

use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::{JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use serde::Serialize;

/// Encode any serializable frame to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode an inbound text frame to a JSON-RPC message
///
/// Frames carrying an `id` decode as responses; frames without one decode as
/// notifications. The two-step parse lets us reject arrays explicitly
/// instead of surfacing a confusing untagged-enum mismatch.
///
/// # Errors
///
/// - `Error::JsonRpc(parse_error)` if the text is not valid JSON or matches
///   no frame shape
/// - `Error::JsonRpc(invalid_request)` for batch arrays
///
/// # Examples
///
/// ```rust
/// use webrpc_core::codec;
///
/// let msg = codec::decode(r#"{"jsonrpc":"2.0","result":42,"id":1}"#).unwrap();
/// assert!(msg.is_response());
/// ```
pub fn decode(data: &str) -> Result<JsonRpcMessage> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|_e| Error::JsonRpc(JsonRpcErrorData::parse_error()))?;

    if value.is_array() {
        return Err(Error::JsonRpc(JsonRpcErrorData::invalid_request(
            "Batch frames are not supported",
        )));
    }

    serde_json::from_value(value).map_err(|_e| Error::JsonRpc(JsonRpcErrorData::parse_error()))
}

/// Encode a JSON-RPC request to JSON
pub fn encode_request(req: &JsonRpcRequest) -> Result<String> {
    encode(req)
}

/// Encode a JSON-RPC notification to JSON
pub fn encode_notification(notif: &JsonRpcNotification) -> Result<String> {
    encode(notif)
}

/// Decode a text frame known to be a response
///
/// Use `decode()` when the frame shape is not known in advance.
pub fn decode_response(data: &str) -> Result<JsonRpcResponse> {
    serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))
}
