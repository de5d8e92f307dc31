//! JSON-RPC 2.0 wire types for the daemon protocol
//!
//! The daemon speaks JSON-RPC 2.0 over a WebSocket text-message stream.
//! Three frame shapes cross the wire:
//!
//! 1. **Request**: a call that expects a response, correlated by `id`
//! 2. **Notification**: a call with no `id` and no response
//! 3. **Response**: the result of processing a request (success or error)
//!
//! # Request IDs
//!
//! This client owns id generation: ids are plain integers, issued
//! monotonically starting at 1 and never reused while a request is pending.
//! Responses may arrive in any order; correlation is solely by id.
//!
//! # Parameters
//!
//! The daemon's methods take positional parameters, so requests always carry
//! a JSON array in `params` (possibly empty). Inbound notifications are
//! decoded leniently because the daemon is free to push object-shaped
//! payloads.

use crate::error::JsonRpcErrorData;
use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 request frame
///
/// A request represents a call to a daemon method that expects a response.
/// The response will have a matching `id` field.
///
/// # Examples
///
/// ```rust
/// use webrpc_core::JsonRpcRequest;
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new("StorageList", vec![json!("f01234")], 7);
/// assert_eq!(req.jsonrpc, "2.0");
/// assert_eq!(req.id, 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Name of the remote method to invoke (including any namespace prefix)
    pub method: String,
    /// Positional parameters; always serialized, even when empty
    pub params: Vec<serde_json::Value>,
    /// Unique identifier correlating this request with its response
    pub id: u64,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request
    ///
    /// The `jsonrpc` field is set to "2.0" per the specification.
    pub fn new(method: impl Into<String>, params: Vec<serde_json::Value>, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 notification frame
///
/// A notification is a request without an `id`: no response is expected and
/// none is ever routed back to a caller. Outbound, the client uses these for
/// fire-and-forget calls; inbound, frames lacking an `id` are unsolicited
/// daemon pushes.
///
/// # Examples
///
/// ```rust
/// use webrpc_core::JsonRpcNotification;
/// use serde_json::json;
///
/// let notif = JsonRpcNotification::new("LogIgnore", Some(json!(["dht"])));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Name of the method or event
    pub method: String,
    /// Optional payload; an array for outbound calls, any shape inbound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC 2.0 notification
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response frame
///
/// Exactly one of `result`/`error` is present: `result` on success, `error`
/// on failure. The `id` matches the originating request. This mutual
/// exclusion is enforced by construction through the factory methods.
///
/// # Examples
///
/// ```rust
/// use webrpc_core::{JsonRpcErrorData, JsonRpcResponse};
/// use serde_json::json;
///
/// let ok = JsonRpcResponse::success(json!({"height": 42}), 1);
/// assert!(ok.is_success());
///
/// let err = JsonRpcResponse::error(JsonRpcErrorData::method_not_found("Nope"), 2);
/// assert!(err.is_error());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// The result of the method invocation, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error information, present only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
    /// Request id from the originating request
    pub id: u64,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(result: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(error: JsonRpcErrorData, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// True if `result` is present
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// True if `error` is present
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Any JSON-RPC 2.0 frame the client can encounter
///
/// Inbound frames are either responses (carrying an `id`) or unsolicited
/// notifications (no `id`). The `Request` variant exists so a misbehaving
/// peer that sends us a request decodes cleanly and can be logged rather
/// than rejected as a parse error.
///
/// # Untagged serialization
///
/// `#[serde(untagged)]` tries the variants in declaration order. A frame
/// with `method` and `id` is a request; `method` without `id` is a
/// notification; `id` without `method` is a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// A request frame (expects a response)
    Request(JsonRpcRequest),
    /// A notification frame (no response expected)
    Notification(JsonRpcNotification),
    /// A response frame (result of processing a request)
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// True for the `Request` variant
    pub fn is_request(&self) -> bool {
        matches!(self, JsonRpcMessage::Request(_))
    }

    /// True for the `Notification` variant
    pub fn is_notification(&self) -> bool {
        matches!(self, JsonRpcMessage::Notification(_))
    }

    /// True for the `Response` variant
    pub fn is_response(&self) -> bool {
        matches!(self, JsonRpcMessage::Response(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let req = JsonRpcRequest::new("Version", vec![], 1);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"Version\""));
        assert!(json.contains("\"params\":[]"));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn test_notification_has_no_id() {
        let notif = JsonRpcNotification::new("Shutdown", None);
        let json = serde_json::to_string(&notif).unwrap();
        assert!(json.contains("\"method\":\"Shutdown\""));
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("\"params\""));
    }

    #[test]
    fn test_response_success() {
        let resp = JsonRpcResponse::success(json!({"status": "ok"}), 3);
        assert!(resp.is_success());
        assert!(!resp.is_error());
        assert_eq!(resp.id, 3);
    }

    #[test]
    fn test_response_error() {
        let resp = JsonRpcResponse::error(JsonRpcErrorData::internal_error("boom"), 4);
        assert!(!resp.is_success());
        assert!(resp.is_error());
    }

    #[test]
    fn test_message_discrimination() {
        let response: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","result":42,"id":1}"#).unwrap();
        assert!(response.is_response());

        let push: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"HeadChange","params":{"h":9}}"#)
                .unwrap();
        assert!(push.is_notification());

        let request: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"Ping","params":[],"id":2}"#)
                .unwrap();
        assert!(request.is_request());
    }

    #[test]
    fn test_error_response_roundtrip() {
        let resp = JsonRpcResponse::error(
            JsonRpcErrorData::with_data(-32000, "busy", json!({"retry_in": 5})),
            9,
        );
        let encoded = serde_json::to_string(&resp).unwrap();
        let decoded: JsonRpcResponse = serde_json::from_str(&encoded).unwrap();
        let err = decoded.error.unwrap();
        assert_eq!(err.code, -32000);
        assert_eq!(err.data, Some(json!({"retry_in": 5})));
    }
}
