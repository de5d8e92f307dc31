//! Core JSON-RPC 2.0 types and codec for webrpc
//!
//! This crate provides the foundational types and utilities for talking to
//! the cluster daemon's JSON-RPC 2.0 endpoint. It includes:
//!
//! - **Types**: the wire structures (requests, responses, notifications)
//! - **Codec**: serialization and deserialization of wire frames
//! - **Error handling**: one error type covering transport, protocol, and
//!   local failures
//!
//! # Architecture
//!
//! The crate is transport-agnostic. It handles frame encoding and decoding
//! but doesn't dictate how frames are transported; `webrpc-client` builds the
//! WebSocket transport, reconnection, and connection supervision on top of
//! this foundation.
//!
//! # Example
//!
//! ```rust
//! use webrpc_core::{codec, JsonRpcRequest};
//!
//! let request = JsonRpcRequest::new("Version", vec![], 1);
//! let json = codec::encode_request(&request).unwrap();
//!
//! let decoded = codec::decode(&json).unwrap();
//! assert!(decoded.is_request());
//! ```

pub mod codec;
pub mod error;
pub mod types;

pub use error::{Error, JsonRpcErrorData, Result};
pub use types::{JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
