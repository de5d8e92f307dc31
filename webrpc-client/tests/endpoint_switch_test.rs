//! Endpoint switching integration tests
//!
//! The full switch path: probe, persist, history bookkeeping, single-flight
//! guarding, instance replacement, and the post-switch cache refresh.

mod common;

use async_trait::async_trait;
use common::MockWsServer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use webrpc_client::{
    CacheInvalidator, CallInterceptor, ConnectionManager, ConnectionStatus, EndpointProbe,
    EndpointStore, ManagerConfig, MemoryStore,
};
use webrpc_core::{Error, Result};

struct StaticProbe(bool);

#[async_trait]
impl EndpointProbe for StaticProbe {
    async fn probe(&self, _endpoint: &str, _timeout: Duration) -> bool {
        self.0
    }
}

struct SlowProbe {
    delay: Duration,
}

#[async_trait]
impl EndpointProbe for SlowProbe {
    async fn probe(&self, _endpoint: &str, _timeout: Duration) -> bool {
        tokio::time::sleep(self.delay).await;
        true
    }
}

#[derive(Default)]
struct RecordingInvalidator {
    invalidations: AtomicUsize,
}

impl CacheInvalidator for RecordingInvalidator {
    fn invalidate_all(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

struct OfflineSimulator;

#[async_trait]
impl CallInterceptor for OfflineSimulator {
    async fn before_call(&self, _method: &str) -> Result<()> {
        Err(Error::Io("simulated offline".to_string()))
    }
}

#[tokio::test]
async fn test_end_to_end_switch_scenario() {
    let config = ManagerConfig {
        store: Arc::new(MemoryStore::with_endpoint("ws://localhost:4701/api/webrpc/v0")),
        probe: Arc::new(StaticProbe(true)),
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::start(config).await.expect("start");
    assert_eq!(manager.endpoint(), "ws://localhost:4701/api/webrpc/v0");
    let generation_before = manager.client_generation();

    let endpoint = manager
        .test_and_switch_endpoint("http://192.168.1.230:4701/")
        .await
        .expect("switch");

    assert_eq!(endpoint, "ws://192.168.1.230:4701/api/webrpc/v0");
    assert_eq!(manager.endpoint(), endpoint);
    assert_eq!(manager.endpoint_history()[0], endpoint);
    assert_eq!(manager.client_generation(), generation_before + 1);
    assert_eq!(manager.reconnect_attempt(), 0);
}

#[tokio::test]
async fn test_concurrent_switch_is_rejected() {
    let config = ManagerConfig {
        probe: Arc::new(SlowProbe {
            delay: Duration::from_millis(300),
        }),
        ..ManagerConfig::default()
    };
    let manager = Arc::new(ConnectionManager::start(config).await.expect("start"));

    let first = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            manager
                .test_and_switch_endpoint("ws://first:1/api/webrpc/v0")
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The second switch fails immediately and changes nothing.
    let second = manager
        .test_and_switch_endpoint("ws://second:1/api/webrpc/v0")
        .await;
    assert!(matches!(second, Err(Error::SwitchInProgress)));

    // The first switch is unaffected by the rejected one.
    let first = first.await.unwrap().expect("first switch");
    assert_eq!(first, "ws://first:1/api/webrpc/v0");
    assert_eq!(manager.endpoint(), first);
    assert_eq!(manager.endpoint_history(), vec![first]);
}

#[tokio::test]
async fn test_switch_guard_is_released_after_failure() {
    let config = ManagerConfig {
        probe: Arc::new(StaticProbe(false)),
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::start(config).await.expect("start");

    let first = manager.test_and_switch_endpoint("ws://a:1/x").await;
    assert!(matches!(first, Err(Error::Unreachable(_))));

    // A failed switch must not leave the single-flight guard engaged.
    let second = manager.test_and_switch_endpoint("ws://b:1/x").await;
    assert!(matches!(second, Err(Error::Unreachable(_))));
}

#[tokio::test]
async fn test_switch_to_live_server_connects_and_refreshes_caches() {
    let server = MockWsServer::echo().await;
    let invalidator = Arc::new(RecordingInvalidator::default());
    let config = ManagerConfig {
        // Nothing listens on the initial endpoint; the switch brings us to
        // the live mock server.
        default_endpoint: "ws://127.0.0.1:1/api/webrpc/v0".to_string(),
        probe: Arc::new(StaticProbe(true)),
        invalidator: Some(Arc::clone(&invalidator) as Arc<dyn CacheInvalidator>),
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::start(config).await.expect("start");

    manager
        .test_and_switch_endpoint(&server.url())
        .await
        .expect("switch");

    // Wait for the new instance to connect and trigger the refresh.
    let mut connected = false;
    for _ in 0..40 {
        if manager.status() == ConnectionStatus::Connected {
            connected = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(connected, "switched instance never connected");
    assert_eq!(invalidator.invalidations.load(Ordering::SeqCst), 1);

    // Calls flow through the new instance.
    let result: Vec<serde_json::Value> = manager.call("Ping", vec![]).await.expect("call");
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_failed_switch_preserves_state_byte_for_byte() {
    let store = Arc::new(MemoryStore::with_endpoint("ws://kept:4701/api/webrpc/v0"));
    let config = ManagerConfig {
        store: Arc::clone(&store) as Arc<dyn EndpointStore>,
        probe: Arc::new(StaticProbe(false)),
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::start(config).await.expect("start");

    let endpoint_before = manager.endpoint();
    let history_before = manager.endpoint_history();
    let stored_before = store.load_endpoint().unwrap();

    let result = manager
        .test_and_switch_endpoint("ws://unreachable:1/x")
        .await;
    assert!(matches!(result, Err(Error::Unreachable(_))));

    assert_eq!(manager.endpoint(), endpoint_before);
    assert_eq!(manager.endpoint_history(), history_before);
    assert_eq!(store.load_endpoint().unwrap(), stored_before);
}

#[tokio::test]
async fn test_interceptor_runs_before_dispatch() {
    let config = ManagerConfig {
        probe: Arc::new(StaticProbe(true)),
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::start(config).await.expect("start");

    manager.install_interceptor(Arc::new(OfflineSimulator));
    let result: Result<serde_json::Value> = manager.call("Version", vec![]).await;
    match result {
        Err(Error::Io(message)) => assert_eq!(message, "simulated offline"),
        other => panic!("expected interceptor error, got {:?}", other),
    }

    // Removing the interceptor restores normal dispatch (which then fails
    // with NotConnected, since nothing is listening).
    manager.remove_interceptor();
    let result: Result<serde_json::Value> = manager.call("Version", vec![]).await;
    assert!(matches!(result, Err(Error::NotConnected)));
}

#[tokio::test]
async fn test_same_endpoint_while_disconnected_reconnects() {
    let server = MockWsServer::echo().await;
    let endpoint = format!("{}/api/webrpc/v0", server.url());
    let config = ManagerConfig {
        store: Arc::new(MemoryStore::with_endpoint(endpoint.clone())),
        probe: Arc::new(StaticProbe(true)),
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::start(config).await.expect("start");

    // Wait for the initial connection, then lose it cleanly (no auto
    // reconnect for clean closes).
    for _ in 0..40 {
        if manager.status() == ConnectionStatus::Connected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    server.close_connections(1000);
    for _ in 0..40 {
        if manager.status() == ConnectionStatus::Disconnected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    let generation_before = manager.client_generation();

    // Switching to the endpoint we already have still replaces the
    // instance, because we are not connected.
    let switched = manager
        .test_and_switch_endpoint(&endpoint)
        .await
        .expect("switch");
    assert_eq!(switched, endpoint);
    assert_eq!(manager.client_generation(), generation_before + 1);

    for _ in 0..40 {
        if manager.status() == ConnectionStatus::Connected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(manager.status(), ConnectionStatus::Connected);
}
