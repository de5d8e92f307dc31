//! Error types for webrpc
//!
//! Two main error types live here:
//!
//! - **Error**: application-level errors for internal use (uses thiserror)
//! - **JsonRpcErrorData**: wire-format errors as defined by JSON-RPC 2.0
//!
//! # Taxonomy
//!
//! `Error` covers the three failure classes the client distinguishes:
//!
//! - *Transport errors* (`WebSocket`, `Io`, `ConnectionClosed`): socket-level
//!   failures. Never fatal to the process; the reconnect loop recovers them
//!   up to the configured attempt ceiling.
//! - *Protocol errors* (`JsonRpc`): well-formed JSON-RPC `error` objects from
//!   the daemon, surfaced by rejecting the specific call that caused them
//!   with the server's code, message, and data intact.
//! - *Local errors* (`NotConnected`, `Timeout`, `Destroyed`,
//!   `SwitchInProgress`, `InvalidEndpoint`, `Unreachable`): produced on this
//!   side, never retried automatically, surfaced to the caller for a
//!   caller-level decision.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for webrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for webrpc operations
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// JSON-RPC protocol error received from the daemon
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// WebSocket transport layer error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Low-level input/output error
    #[error("IO error: {0}")]
    Io(String),

    /// A call was attempted while the socket was not open
    ///
    /// Calls are never queued until connected; they fail immediately.
    #[error("Not connected")]
    NotConnected,

    /// No response arrived within the configured per-call timeout
    #[error("Request timeout")]
    Timeout,

    /// The connection closed while the request was pending
    #[error("Connection closed")]
    ConnectionClosed,

    /// The client was destroyed; `connect()` is permanently refused
    #[error("Client destroyed")]
    Destroyed,

    /// A concurrent endpoint switch was rejected by the single-flight guard
    #[error("Another endpoint switch is already in progress.")]
    SwitchInProgress,

    /// The endpoint string is empty or has an unusable scheme
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The reachability probe failed before committing to a switch
    #[error("Could not connect to {0}")]
    Unreachable(String),
}

impl Error {
    /// The JSON-RPC error code, if this is a protocol error
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::JsonRpc(e) => Some(e.code),
            _ => None,
        }
    }

    /// The JSON-RPC error data, if this is a protocol error carrying any
    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Error::JsonRpc(e) => e.data.as_ref(),
            _ => None,
        }
    }
}

/// JSON-RPC 2.0 error object as defined in the specification
///
/// This structure is the exact wire format appearing in the `error` field of
/// a response. The spec reserves codes -32768 to -32000; the daemon uses the
/// standard set plus implementation-defined server errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code indicating the error type
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create a new JSON-RPC error with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new JSON-RPC error with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Parse error (-32700): invalid JSON was received
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    /// Invalid request (-32600): the JSON is valid but the frame is malformed
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(-32600, msg)
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(-32601, format!("Method not found: {}", method.into()))
    }

    /// Invalid params (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(-32602, msg)
    }

    /// Internal error (-32603)
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(-32603, msg)
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message" for readability in logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}
