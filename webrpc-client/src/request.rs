//! Request tracking for the JSON-RPC client
//!
//! Manages the lifecycle of outgoing requests, correlating each with its
//! eventual response.
//!
//! # Request Lifecycle
//!
//! 1. **Register**: allocate the next id and a oneshot channel in one step,
//!    so an id in the pending map always has a live waiter
//! 2. **Send**: the client transmits the request over the socket
//! 3. **Wait**: the caller races the oneshot receiver against the per-call
//!    timeout (`tokio::time::timeout`)
//! 4. **Complete**: a response arrives, is matched by id, and sent through
//!    the channel
//!
//! On timeout, the caller removes its entry *before* reporting the failure;
//! a response arriving afterwards finds no entry and is dropped silently.
//! On disconnect, every pending entry is failed at once, never dropped.
//!
//! # Why Oneshot Channels?
//!
//! Responses arrive asynchronously and out of order. A dedicated oneshot
//! per request gives natural async/await integration and automatic cleanup.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use webrpc_core::{Error, JsonRpcResponse, Result};

/// Pending request waiting for a response
struct PendingRequest {
    tx: oneshot::Sender<Result<JsonRpcResponse>>,
}

/// Tracks pending requests and issues request ids
///
/// Ids start at 1 and increase monotonically for the lifetime of one client
/// instance; an id is never reused while its request is pending.
#[derive(Clone)]
pub(crate) struct RequestManager {
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    counter: Arc<Mutex<u64>>,
}

impl RequestManager {
    pub(crate) fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(Mutex::new(0)),
        }
    }

    /// Allocate the next id and register a pending entry for it
    pub(crate) async fn register(&self) -> (u64, oneshot::Receiver<Result<JsonRpcResponse>>) {
        let id = {
            let mut counter = self.counter.lock().await;
            *counter += 1;
            *counter
        };

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, PendingRequest { tx });
        (id, rx)
    }

    /// Complete a pending request with the response matching its id
    ///
    /// A response whose id has no pending entry (already timed out, or never
    /// ours) is dropped silently.
    pub(crate) async fn complete(&self, response: JsonRpcResponse) {
        let id = response.id;
        if let Some(pending) = self.pending.lock().await.remove(&id) {
            let _ = pending.tx.send(Ok(response));
        } else {
            tracing::debug!(id, "Response for unknown or timed-out request, ignoring");
        }
    }

    /// Remove a pending entry without resolving it
    ///
    /// Used by the timeout path so a late response cannot reach the caller.
    pub(crate) async fn remove(&self, id: u64) -> bool {
        self.pending.lock().await.remove(&id).is_some()
    }

    /// Fail every pending request with the given error
    pub(crate) async fn fail_all(&self, error: Error) {
        let mut pending = self.pending.lock().await;
        for (_, req) in pending.drain() {
            let _ = req.tx.send(Err(error.clone()));
        }
    }

    /// Number of requests currently awaiting a response
    pub(crate) async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new()
    }
}
