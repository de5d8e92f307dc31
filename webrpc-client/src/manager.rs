//! Connection supervision and endpoint switching
//!
//! The manager owns exactly one live `RpcClient` and gives the rest of the
//! application a stable identity for "the current connection" that survives
//! instance replacement: `status()`, `endpoint()`, and `endpoint_history()`
//! keep answering while the underlying client is torn down and rebuilt.
//!
//! Only the manager constructs or discards client instances. A replaced
//! instance's in-flight requests are rejected by its teardown, never
//! migrated to the successor.
//!
//! # Status
//!
//! Status is owned here and driven by client events, so it is never stale
//! during an instance swap:
//!
//! ```text
//! Connecting -(open)-> Connected -(abnormal close)-> Disconnected
//!                          ^                              |
//!                          +------- Reconnecting <--------+
//! ```
//!
//! An explicit switch moves any state back to Connecting on a fresh
//! instance.

use crate::client::{ClientOptions, RpcClient};
use crate::endpoint::{normalize_endpoint, push_history, DEFAULT_ENDPOINT};
use crate::metrics::ClientMetrics;
use crate::storage::{EndpointStore, MemoryStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use webrpc_core::{Error, Result};

/// Connection status as published to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Attempting the first connection of the current instance
    Connecting,
    /// Socket open and usable
    Connected,
    /// Socket lost or closed; no retry currently scheduled
    Disconnected,
    /// Socket lost; retry `attempt` is scheduled or running
    Reconnecting { attempt: u32 },
}

/// Out-of-band reachability probe, consulted before committing to a switch
///
/// Implementations must not hold the probed connection open and must not
/// touch the live connection.
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> bool;
}

/// Probe that opens a WebSocket to the endpoint and closes it immediately
pub struct WsProbe;

#[async_trait]
impl EndpointProbe for WsProbe {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> bool {
        let Ok(url) = crate::endpoint::transport_url(endpoint) else {
            return false;
        };
        match tokio::time::timeout(timeout, crate::transport::connect(&url)).await {
            Ok(Ok((mut sink, _stream))) => {
                use futures::SinkExt;
                let _ = sink.send(crate::transport::close_frame()).await;
                let _ = sink.close().await;
                true
            }
            _ => false,
        }
    }
}

/// Invalidates every RPC-derived cache after a post-switch reconnect
///
/// Invoked exactly once per successful switch, on the new instance's first
/// `connected` event, so stale data from the old endpoint is never shown
/// silently.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate_all(&self);
}

/// Optional middleware the manager runs before dispatching each call
///
/// Useful for simulating network delay or an offline daemon in development
/// builds without touching the transport.
#[async_trait]
pub trait CallInterceptor: Send + Sync {
    async fn before_call(&self, method: &str) -> Result<()>;
}

/// Configuration for a supervised connection
pub struct ManagerConfig {
    /// Endpoint used when the store has none
    pub default_endpoint: String,
    /// Per-call response timeout
    pub timeout: Duration,
    /// Base delay for reconnect backoff
    pub reconnect_interval: Duration,
    /// Reconnect attempts before giving up permanently
    pub max_reconnect_attempts: u32,
    /// Namespace prepended to every method name (empty for none)
    pub method_prefix: String,
    /// Time budget for the reachability probe
    pub probe_timeout: Duration,
    /// Durable endpoint/history storage
    pub store: Arc<dyn EndpointStore>,
    /// Reachability probe used by `test_and_switch_endpoint`
    pub probe: Arc<dyn EndpointProbe>,
    /// Cache invalidation hook, if the application has caches to flush
    pub invalidator: Option<Arc<dyn CacheInvalidator>>,
    /// Metrics shared across client instances
    pub metrics: Option<Arc<ClientMetrics>>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
            reconnect_interval: Duration::from_secs(1),
            max_reconnect_attempts: 10,
            method_prefix: String::new(),
            probe_timeout: Duration::from_secs(5),
            store: Arc::new(MemoryStore::new()),
            probe: Arc::new(WsProbe),
            invalidator: None,
            metrics: None,
        }
    }
}

/// Manager state shared with client event handlers
struct Shared {
    status: RwLock<ConnectionStatus>,
    endpoint: RwLock<String>,
    history: RwLock<Vec<String>>,
    reconnect_attempt: AtomicU32,
    refresh_pending: AtomicBool,
    switch_in_flight: AtomicBool,
    generation: AtomicU64,
    invalidator: Mutex<Option<Arc<dyn CacheInvalidator>>>,
}

/// Client settings applied to every instance the manager constructs
struct ClientSettings {
    timeout: Duration,
    reconnect_interval: Duration,
    max_reconnect_attempts: u32,
    method_prefix: String,
}

/// Supervises one RPC client and the endpoint it talks to
pub struct ConnectionManager {
    shared: Arc<Shared>,
    client: tokio::sync::RwLock<RpcClient>,
    settings: ClientSettings,
    store: Arc<dyn EndpointStore>,
    probe: Arc<dyn EndpointProbe>,
    probe_timeout: Duration,
    interceptor: Mutex<Option<Arc<dyn CallInterceptor>>>,
    metrics: Option<Arc<ClientMetrics>>,
}

/// Clears the single-flight flag on every exit path of a switch
struct SwitchGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl ConnectionManager {
    /// Load the stored endpoint, construct the first client, and begin
    /// connecting in the background
    ///
    /// Errors are storage failures only; a daemon that is down at startup
    /// surfaces as `Disconnected` status, not as an error here.
    pub async fn start(config: ManagerConfig) -> Result<Self> {
        let stored = config
            .store
            .load_endpoint()
            .map_err(|e| Error::Io(e.to_string()))?;
        let endpoint = stored.unwrap_or_else(|| config.default_endpoint.clone());
        let history = config
            .store
            .load_history()
            .map_err(|e| Error::Io(e.to_string()))?;

        let shared = Arc::new(Shared {
            status: RwLock::new(ConnectionStatus::Connecting),
            endpoint: RwLock::new(endpoint.clone()),
            history: RwLock::new(history),
            reconnect_attempt: AtomicU32::new(0),
            refresh_pending: AtomicBool::new(false),
            switch_in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            invalidator: Mutex::new(config.invalidator),
        });

        let settings = ClientSettings {
            timeout: config.timeout,
            reconnect_interval: config.reconnect_interval,
            max_reconnect_attempts: config.max_reconnect_attempts,
            method_prefix: config.method_prefix,
        };

        let client = build_client(&settings, &shared, &config.metrics, &endpoint);
        spawn_connect(client.clone(), Arc::clone(&shared));

        Ok(Self {
            shared,
            client: tokio::sync::RwLock::new(client),
            settings,
            store: config.store,
            probe: config.probe,
            probe_timeout: config.probe_timeout,
            interceptor: Mutex::new(None),
            metrics: config.metrics,
        })
    }

    /// Current connection status
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.read().unwrap().clone()
    }

    /// Currently published endpoint
    pub fn endpoint(&self) -> String {
        self.shared.endpoint.read().unwrap().clone()
    }

    /// Endpoint history, most recent first
    pub fn endpoint_history(&self) -> Vec<String> {
        self.shared.history.read().unwrap().clone()
    }

    /// Reconnect attempt currently displayed (0 outside reconnection)
    pub fn reconnect_attempt(&self) -> u32 {
        self.shared.reconnect_attempt.load(Ordering::SeqCst)
    }

    /// Counts constructed client instances; increases on every switch that
    /// replaces the live instance
    pub fn client_generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Replace the cache invalidation hook
    pub fn set_invalidator(&self, invalidator: Arc<dyn CacheInvalidator>) {
        *self.shared.invalidator.lock().unwrap() = Some(invalidator);
    }

    /// Install (or replace) the call interceptor
    pub fn install_interceptor(&self, interceptor: Arc<dyn CallInterceptor>) {
        *self.interceptor.lock().unwrap() = Some(interceptor);
    }

    /// Remove the call interceptor
    pub fn remove_interceptor(&self) {
        *self.interceptor.lock().unwrap() = None;
    }

    /// Dispatch a call through the current client
    ///
    /// Calls run concurrently with everything except the brief moment a
    /// switch swaps the instance; they are never blocked by the switch
    /// single-flight guard.
    pub async fn call<T>(&self, method: &str, params: Vec<serde_json::Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let interceptor = self.interceptor.lock().unwrap().clone();
        if let Some(interceptor) = interceptor {
            interceptor.before_call(method).await?;
        }
        let client = self.client.read().await.clone();
        client.call(method, params).await
    }

    /// Dispatch a notification through the current client
    pub async fn notify(&self, method: &str, params: Vec<serde_json::Value>) -> Result<()> {
        let client = self.client.read().await.clone();
        client.notify(method, params).await
    }

    /// Probe `input` and, if reachable, make it the active endpoint
    ///
    /// Returns the normalized endpoint on success, whether or not the live
    /// instance had to be replaced. On any failure the published endpoint
    /// and history are untouched.
    pub async fn test_and_switch_endpoint(&self, input: &str) -> Result<String> {
        let Some(normalized) = normalize_endpoint(input) else {
            return Err(Error::InvalidEndpoint(input.to_string()));
        };

        // Single-flight: a concurrent switch is rejected, never queued.
        if self
            .shared
            .switch_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::SwitchInProgress);
        }
        let _guard = SwitchGuard {
            flag: &self.shared.switch_in_flight,
        };

        if !self.probe.probe(&normalized, self.probe_timeout).await {
            tracing::warn!(endpoint = %normalized, "Endpoint probe failed, keeping current endpoint");
            return Err(Error::Unreachable(normalized));
        }

        self.store
            .store_endpoint(&normalized)
            .map_err(|e| Error::Io(e.to_string()))?;
        let updated_history = {
            let history = self.shared.history.read().unwrap();
            push_history(&history, &normalized)
        };
        *self.shared.history.write().unwrap() = updated_history.clone();
        self.store
            .store_history(&updated_history)
            .map_err(|e| Error::Io(e.to_string()))?;

        // A fresh instance is needed when the endpoint changes, and also
        // when it doesn't but we are not connected (switching to the same
        // endpoint while down means "reconnect now").
        let current = self.shared.endpoint.read().unwrap().clone();
        let needs_replacement =
            normalized != current || self.status() != ConnectionStatus::Connected;

        if needs_replacement {
            self.shared.refresh_pending.store(true, Ordering::SeqCst);
            *self.shared.endpoint.write().unwrap() = normalized.clone();
            self.shared.reconnect_attempt.store(0, Ordering::SeqCst);
            *self.shared.status.write().unwrap() = ConnectionStatus::Connecting;

            let fresh = build_client(&self.settings, &self.shared, &self.metrics, &normalized);
            let old = {
                let mut slot = self.client.write().await;
                std::mem::replace(&mut *slot, fresh.clone())
            };
            // Listeners are replaced, not stacked: silence the old instance
            // before tearing it down so its final events cannot clobber the
            // fresh instance's status.
            old.clear_handlers();
            old.destroy().await;

            spawn_connect(fresh, Arc::clone(&self.shared));
            tracing::info!(endpoint = %normalized, "Switched RPC endpoint");
        }

        Ok(normalized)
    }

    /// Tear down the supervised client
    pub async fn shutdown(&self) {
        let client = self.client.read().await.clone();
        client.clear_handlers();
        client.destroy().await;
        *self.shared.status.write().unwrap() = ConnectionStatus::Disconnected;
    }
}

/// Construct a client bound to `endpoint` and wire its events into the
/// manager-owned state
fn build_client(
    settings: &ClientSettings,
    shared: &Arc<Shared>,
    metrics: &Option<Arc<ClientMetrics>>,
    endpoint: &str,
) -> RpcClient {
    let options = ClientOptions::new(endpoint)
        .with_timeout(settings.timeout)
        .with_reconnect_interval(settings.reconnect_interval)
        .with_max_reconnect_attempts(settings.max_reconnect_attempts)
        .with_method_prefix(settings.method_prefix.clone());

    let client = match metrics {
        Some(m) => RpcClient::with_metrics(options, Arc::clone(m)),
        None => RpcClient::new(options),
    };
    shared.generation.fetch_add(1, Ordering::SeqCst);

    let s = Arc::clone(shared);
    client.on_connected(move || {
        *s.status.write().unwrap() = ConnectionStatus::Connected;
        s.reconnect_attempt.store(0, Ordering::SeqCst);
        if s.refresh_pending.swap(false, Ordering::SeqCst) {
            let invalidator = s.invalidator.lock().unwrap().clone();
            if let Some(invalidator) = invalidator {
                tracing::debug!("Invalidating RPC-derived caches after endpoint switch");
                invalidator.invalidate_all();
            }
        }
    });

    let s = Arc::clone(shared);
    client.on_disconnected(move || {
        *s.status.write().unwrap() = ConnectionStatus::Disconnected;
    });

    let s = Arc::clone(shared);
    client.on_reconnecting(move |attempt| {
        *s.status.write().unwrap() = ConnectionStatus::Reconnecting { attempt };
        s.reconnect_attempt.store(attempt, Ordering::SeqCst);
    });

    client.on_error(move |error| {
        tracing::debug!(error = %error, "Client error event");
    });

    client
}

/// Drive `connect()` in the background; a failure leaves Disconnected status
/// instead of propagating (the caller can retry or switch)
fn spawn_connect(client: RpcClient, shared: Arc<Shared>) {
    let generation = shared.generation.load(Ordering::SeqCst);
    tokio::spawn(async move {
        if let Err(e) = client.connect().await {
            tracing::warn!(error = %e, "Connection attempt failed");
            // A slow failure must not clobber the status of an instance
            // that has replaced this one in the meantime.
            if shared.generation.load(Ordering::SeqCst) == generation {
                *shared.status.write().unwrap() = ConnectionStatus::Disconnected;
            }
        }
    });
}
