//! JSON-RPC client over a persistent WebSocket
//!
//! This module provides `RpcClient`, which owns one WebSocket connection to
//! the daemon, correlates requests with responses by id, and recovers from
//! abnormal disconnects with capped exponential backoff.
//!
//! # Client Lifecycle
//!
//! 1. **Construct**: `RpcClient::new(options)` builds a disconnected client
//! 2. **Connect**: `connect()` opens the socket and spawns the receive loop
//! 3. **Use**: `call()` / `notify()`, observe lifecycle events
//! 4. **Disconnect**: clean close; pending calls are rejected, a later
//!    `connect()` is allowed
//! 5. **Destroy**: terminal teardown; `connect()` is refused from then on
//!
//! # Cloning
//!
//! `RpcClient` is cheaply cloneable using `Arc` internally. All clones share
//! the same connection, pending map, and event slots.
//!
//! # Reconnection
//!
//! Only an abnormal close (code other than 1000) triggers reconnection.
//! The delay before attempt `n` is `min(reconnect_interval * 2^n, 30s)`;
//! after `max_reconnect_attempts` failures the client stays disconnected
//! until the caller invokes `connect()` again or replaces the instance.

use crate::endpoint::transport_url;
use crate::events::EventBus;
use crate::metrics::ClientMetrics;
use crate::reconnect::{ExponentialBackoff, MAX_RECONNECT_DELAY};
use crate::request::RequestManager;
use crate::transport::{self, Disconnect, WsSink, WsStream};
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use webrpc_core::{codec, Error, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, Result};

/// Configuration for one client instance
///
/// Immutable for the lifetime of the instance; switching endpoints always
/// constructs a fresh client with fresh options.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Remote endpoint; `ws(s)://` is used as-is, `http(s)://` is mapped
    pub endpoint: String,
    /// Per-call response timeout
    pub timeout: Duration,
    /// Base delay for reconnect backoff
    pub reconnect_interval: Duration,
    /// Reconnect attempts before giving up permanently
    pub max_reconnect_attempts: u32,
    /// Namespace prepended to every method name (empty for none)
    pub method_prefix: String,
}

impl ClientOptions {
    /// Options with the default timeout (60s), reconnect interval (1s),
    /// attempt ceiling (10), and no method prefix
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(60),
            reconnect_interval: Duration::from_secs(1),
            max_reconnect_attempts: 10,
            method_prefix: String::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_method_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.method_prefix = prefix.into();
        self
    }
}

/// JSON-RPC client over WebSocket
#[derive(Clone)]
pub struct RpcClient {
    options: Arc<ClientOptions>,
    /// Sink half of the socket; `None` while disconnected
    sender: Arc<Mutex<Option<WsSink>>>,
    request_manager: RequestManager,
    events: EventBus,
    connected: Arc<AtomicBool>,
    destroyed: Arc<AtomicBool>,
    reconnect_attempts: Arc<AtomicU32>,
    /// Receive loop task; aborting it also cancels a scheduled retry timer
    receive_task: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl RpcClient {
    /// Construct a disconnected client
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options: Arc::new(options),
            sender: Arc::new(Mutex::new(None)),
            request_manager: RequestManager::new(),
            events: EventBus::new(),
            connected: Arc::new(AtomicBool::new(false)),
            destroyed: Arc::new(AtomicBool::new(false)),
            reconnect_attempts: Arc::new(AtomicU32::new(0)),
            receive_task: Arc::new(Mutex::new(None)),
            metrics: None,
        }
    }

    /// Construct a disconnected client that records metrics
    pub fn with_metrics(options: ClientOptions, metrics: Arc<ClientMetrics>) -> Self {
        let mut client = Self::new(options);
        client.metrics = Some(metrics);
        client
    }

    /// Open the socket and start the receive loop
    ///
    /// Resolves when the socket is open; rejects on any pre-open error.
    /// Refused with `Error::Destroyed` after `destroy()`. Calling it on an
    /// already-connected client is a no-op.
    pub async fn connect(&self) -> Result<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(Error::Destroyed);
        }
        if self.is_connected() {
            tracing::debug!("connect() on a live client, ignoring");
            return Ok(());
        }

        let url = transport_url(&self.options.endpoint)?;
        tracing::info!(url = %url, "Connecting to daemon");
        if let Some(m) = &self.metrics {
            m.update_connection_state(1);
        }

        let (sink, stream) = transport::connect(&url).await?;

        // A teardown may have raced the handshake; dropping the halves
        // closes the socket without ever exposing it.
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(Error::Destroyed);
        }

        *self.sender.lock().await = Some(sink);
        self.connected.store(true, Ordering::SeqCst);
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        if let Some(m) = &self.metrics {
            m.update_connection_state(2);
        }
        tracing::info!("Connected");
        self.events.emit_connected();

        let task = tokio::spawn(Self::receive_loop(self.clone(), stream, url));
        let mut guard = self.receive_task.lock().await;
        if let Some(old) = guard.take() {
            old.abort();
        }
        *guard = Some(task);

        Ok(())
    }

    /// True while the socket is open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of requests currently awaiting a response
    pub async fn pending_request_count(&self) -> usize {
        self.request_manager.pending_count().await
    }

    /// Read-only copy of this instance's configuration
    pub fn options(&self) -> ClientOptions {
        (*self.options).clone()
    }

    /// Send a request and wait for the matching response
    ///
    /// Fails immediately with `Error::NotConnected` while the socket is not
    /// open; requests are never queued. A response not arriving within the
    /// configured timeout fails the call with `Error::Timeout` after the
    /// pending entry is removed, so a late response resolves nobody.
    pub async fn call<T>(&self, method: &str, params: Vec<serde_json::Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let start = std::time::Instant::now();
        let method = self.full_method(method);
        let (id, rx) = self.request_manager.register().await;
        let request = JsonRpcRequest::new(method.clone(), params, id);
        let text = codec::encode_request(&request)?;

        let send_result = {
            let mut sender = self.sender.lock().await;
            match sender.as_mut() {
                Some(sink) => sink
                    .send(Message::Text(text))
                    .await
                    .map_err(|e| Error::WebSocket(e.to_string())),
                None => Err(Error::NotConnected),
            }
        };
        if let Err(e) = send_result {
            self.request_manager.remove(id).await;
            return Err(e);
        }
        tracing::debug!(method = %method, id, "Request sent, waiting for response");

        let response = match tokio::time::timeout(self.options.timeout, rx).await {
            Err(_elapsed) => {
                // Remove the entry first; a response arriving from now on is
                // silently ignored and cannot reach this caller.
                self.request_manager.remove(id).await;
                if let Some(m) = &self.metrics {
                    m.record_request(&method, "timeout", start.elapsed().as_secs_f64());
                }
                tracing::warn!(method = %method, id, "Request timed out");
                return Err(Error::Timeout);
            }
            Ok(Err(_closed)) => return Err(Error::ConnectionClosed),
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Ok(Ok(response))) => response,
        };

        let duration = start.elapsed().as_secs_f64();

        if let Some(error) = response.error {
            if let Some(m) = &self.metrics {
                m.record_request(&method, "error", duration);
                m.record_error("json_rpc");
            }
            tracing::error!(method = %method, error = %error, "Request failed");
            return Err(Error::JsonRpc(error));
        }

        let result = response.result.unwrap_or(serde_json::Value::Null);
        let deserialized =
            serde_json::from_value(result).map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(m) = &self.metrics {
            m.record_request(&method, "success", duration);
        }
        tracing::debug!(method = %method, duration_secs = duration, "Request completed");
        Ok(deserialized)
    }

    /// Send a fire-and-forget notification (no id, no response)
    ///
    /// Warns and does nothing while disconnected.
    pub async fn notify(&self, method: &str, params: Vec<serde_json::Value>) -> Result<()> {
        if !self.is_connected() {
            tracing::warn!(method, "notify() while disconnected, dropping");
            return Ok(());
        }

        let method = self.full_method(method);
        let notification =
            JsonRpcNotification::new(method.clone(), Some(serde_json::Value::Array(params)));
        let text = codec::encode_notification(&notification)?;

        let mut sender = self.sender.lock().await;
        match sender.as_mut() {
            Some(sink) => sink
                .send(Message::Text(text))
                .await
                .map_err(|e| Error::WebSocket(e.to_string())),
            None => {
                tracing::warn!(method = %method, "notify() while disconnected, dropping");
                Ok(())
            }
        }
    }

    /// Close cleanly (code 1000) and cancel any scheduled reconnect
    ///
    /// Every pending request is rejected with `Error::ConnectionClosed`,
    /// never silently dropped. Not terminal: `connect()` may be called
    /// again afterwards. See `destroy()` for the terminal teardown.
    pub async fn disconnect(&self) {
        if let Some(task) = self.receive_task.lock().await.take() {
            task.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
        self.reconnect_attempts.store(0, Ordering::SeqCst);

        if let Some(mut sink) = self.sender.lock().await.take() {
            let _ = sink.send(transport::close_frame()).await;
            let _ = sink.close().await;
        }

        self.request_manager.fail_all(Error::ConnectionClosed).await;
        if let Some(m) = &self.metrics {
            m.update_connection_state(0);
        }
        tracing::info!("Disconnected");
        self.events.emit_disconnected();
    }

    /// Terminal teardown: disconnect and refuse any future `connect()`
    pub async fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.disconnect().await;
        self.events.clear();
    }

    /// Register the `connected` handler (replaces any previous one)
    pub fn on_connected(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.events.on_connected(handler);
    }

    /// Register the `disconnected` handler (replaces any previous one)
    pub fn on_disconnected(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.events.on_disconnected(handler);
    }

    /// Register the `error` handler (replaces any previous one)
    pub fn on_error(&self, handler: impl Fn(Error) + Send + Sync + 'static) {
        self.events.on_error(handler);
    }

    /// Register the `reconnecting` handler (replaces any previous one)
    ///
    /// The handler receives the 0-indexed attempt number just before the
    /// attempt is made.
    pub fn on_reconnecting(&self, handler: impl Fn(u32) + Send + Sync + 'static) {
        self.events.on_reconnecting(handler);
    }

    /// Register the handler for unsolicited daemon pushes
    pub fn on_notification(&self, handler: impl Fn(JsonRpcNotification) + Send + Sync + 'static) {
        self.events.on_notification(handler);
    }

    /// Drop every registered event handler
    pub fn clear_handlers(&self) {
        self.events.clear();
    }

    fn full_method(&self, method: &str) -> String {
        if self.options.method_prefix.is_empty() {
            method.to_string()
        } else {
            format!("{}{}", self.options.method_prefix, method)
        }
    }

    /// Read frames until the connection ends, then reconnect if warranted
    async fn receive_loop(client: RpcClient, mut stream: WsStream, url: String) {
        let policy = ExponentialBackoff::new(client.options.reconnect_interval, MAX_RECONNECT_DELAY)
            .with_max_attempts(client.options.max_reconnect_attempts);

        loop {
            let disconnect = Self::drive(&client, &mut stream).await;

            client.connected.store(false, Ordering::SeqCst);
            client.sender.lock().await.take();
            client.request_manager.fail_all(Error::ConnectionClosed).await;
            if let Some(m) = &client.metrics {
                m.update_connection_state(0);
            }
            client.events.emit_disconnected();

            if disconnect.is_clean() || client.destroyed.load(Ordering::SeqCst) {
                tracing::info!("Connection closed cleanly");
                return;
            }
            tracing::warn!(?disconnect, "Connection lost");

            // Abnormal close: retry with capped exponential backoff until
            // connected or the attempt ceiling is reached.
            loop {
                let attempt = client.reconnect_attempts.load(Ordering::SeqCst);
                let Some(delay) = policy.delay_for(attempt) else {
                    tracing::error!(
                        attempts = attempt,
                        "Reconnection abandoned (max attempts reached)"
                    );
                    if let Some(m) = &client.metrics {
                        m.update_connection_state(4);
                    }
                    return;
                };

                tokio::time::sleep(delay).await;

                client.events.emit_reconnecting(attempt);
                if let Some(m) = &client.metrics {
                    m.update_connection_state(3);
                    m.record_reconnection_attempt();
                }
                tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

                match transport::connect(&url).await {
                    Ok((sink, new_stream)) => {
                        *client.sender.lock().await = Some(sink);
                        client.connected.store(true, Ordering::SeqCst);
                        client.reconnect_attempts.store(0, Ordering::SeqCst);
                        if let Some(m) = &client.metrics {
                            m.update_connection_state(2);
                            m.record_reconnection_success();
                        }
                        tracing::info!("Reconnected");
                        client.events.emit_connected();
                        stream = new_stream;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "Reconnection failed");
                        client.reconnect_attempts.fetch_add(1, Ordering::SeqCst);
                        client.events.emit_error(e);
                    }
                }
            }
        }
    }

    /// Process inbound frames until the connection ends
    async fn drive(client: &RpcClient, stream: &mut WsStream) -> Disconnect {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Err(e) = client.handle_frame(&text).await {
                        tracing::error!(error = %e, "Error handling frame");
                        if let Some(m) = &client.metrics {
                            m.record_error("frame_handling");
                        }
                        client.events.emit_error(e);
                    }
                }
                Ok(Message::Close(frame)) => {
                    return Disconnect::from_close_frame(frame);
                }
                Ok(_) => {} // ping/pong/binary carry no protocol frames
                Err(e) => {
                    tracing::error!(error = %e, "WebSocket error");
                    if let Some(m) = &client.metrics {
                        m.record_error("websocket");
                    }
                    client.events.emit_error(Error::WebSocket(e.to_string()));
                    return Disconnect::Abnormal(None);
                }
            }
        }
        // Stream ended without a closing handshake.
        Disconnect::Abnormal(None)
    }

    /// Route one inbound frame
    async fn handle_frame(&self, text: &str) -> Result<()> {
        match codec::decode(text)? {
            JsonRpcMessage::Response(response) => {
                self.request_manager.complete(response).await;
            }
            JsonRpcMessage::Notification(push) => {
                if let Some(m) = &self.metrics {
                    m.record_notification(&push.method);
                }
                tracing::debug!(method = %push.method, "Notification received");
                self.events.emit_notification(push);
            }
            JsonRpcMessage::Request(request) => {
                tracing::warn!(method = %request.method, "Received unexpected request frame");
            }
        }
        Ok(())
    }
}
