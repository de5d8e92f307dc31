//! Lifecycle event bus for the RPC client
//!
//! One handler slot per event; registering again replaces the previous
//! handler. Unsolicited daemon pushes arrive on their own slot and are
//! logged and dropped when nobody listens.
//!
//! Handlers run synchronously on the receive loop's task, so they should be
//! quick: update a status field, flip a flag, hand off to a channel.

use std::sync::{Arc, Mutex};
use webrpc_core::{Error, JsonRpcNotification};

type UnitHandler = Arc<dyn Fn() + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(Error) + Send + Sync>;
type AttemptHandler = Arc<dyn Fn(u32) + Send + Sync>;
type PushHandler = Arc<dyn Fn(JsonRpcNotification) + Send + Sync>;

#[derive(Default)]
struct Slots {
    connected: Option<UnitHandler>,
    disconnected: Option<UnitHandler>,
    error: Option<ErrorHandler>,
    reconnecting: Option<AttemptHandler>,
    notification: Option<PushHandler>,
}

/// Single-slot event registry shared by all clones of a client
#[derive(Clone, Default)]
pub(crate) struct EventBus {
    slots: Arc<Mutex<Slots>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_connected(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.slots.lock().unwrap().connected = Some(Arc::new(handler));
    }

    pub(crate) fn on_disconnected(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.slots.lock().unwrap().disconnected = Some(Arc::new(handler));
    }

    pub(crate) fn on_error(&self, handler: impl Fn(Error) + Send + Sync + 'static) {
        self.slots.lock().unwrap().error = Some(Arc::new(handler));
    }

    pub(crate) fn on_reconnecting(&self, handler: impl Fn(u32) + Send + Sync + 'static) {
        self.slots.lock().unwrap().reconnecting = Some(Arc::new(handler));
    }

    pub(crate) fn on_notification(
        &self,
        handler: impl Fn(JsonRpcNotification) + Send + Sync + 'static,
    ) {
        self.slots.lock().unwrap().notification = Some(Arc::new(handler));
    }

    /// Drop every registered handler
    ///
    /// Called when an instance is torn down, so a replaced client can no
    /// longer reach its old listeners.
    pub(crate) fn clear(&self) {
        *self.slots.lock().unwrap() = Slots::default();
    }

    // The handler Arc is cloned out of the lock before the call, so a
    // handler that re-registers handlers cannot deadlock.

    pub(crate) fn emit_connected(&self) {
        let handler = self.slots.lock().unwrap().connected.clone();
        if let Some(h) = handler {
            h();
        }
    }

    pub(crate) fn emit_disconnected(&self) {
        let handler = self.slots.lock().unwrap().disconnected.clone();
        if let Some(h) = handler {
            h();
        }
    }

    pub(crate) fn emit_error(&self, error: Error) {
        let handler = self.slots.lock().unwrap().error.clone();
        if let Some(h) = handler {
            h(error);
        }
    }

    pub(crate) fn emit_reconnecting(&self, attempt: u32) {
        let handler = self.slots.lock().unwrap().reconnecting.clone();
        if let Some(h) = handler {
            h(attempt);
        }
    }

    pub(crate) fn emit_notification(&self, push: JsonRpcNotification) {
        let handler = self.slots.lock().unwrap().notification.clone();
        match handler {
            Some(h) => h(push),
            None => {
                tracing::debug!(method = %push.method, "Unsolicited notification dropped (no handler)")
            }
        }
    }
}
