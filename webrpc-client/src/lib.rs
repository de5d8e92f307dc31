//! JSON-RPC 2.0 client and connection supervision over WebSocket
//!
//! This crate provides the transport layer of the daemon dashboard: a
//! JSON-RPC 2.0 client running over a single persistent WebSocket, plus a
//! connection manager that supervises that client, recovers from failures,
//! and hot-swaps the remote endpoint without corrupting in-flight state.
//!
//! # Core Features
//!
//! - **Request-Response**: send requests and await typed responses,
//!   correlated by id over an order-agnostic transport
//! - **Per-call timeouts**: a stuck daemon shows up as a timeout, never an
//!   indefinite hang
//! - **Auto-Reconnection**: capped exponential backoff on abnormal closes,
//!   with a hard attempt ceiling; explicit disconnects never reconnect
//! - **Endpoint supervision**: durable endpoint + history, reachability
//!   probing, and atomic instance replacement on switch
//! - **Observability**: `tracing` logging and optional OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use webrpc_client::{ClientOptions, RpcClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RpcClient::new(ClientOptions::new("ws://localhost:4701/api/webrpc/v0"));
//!     client.connect().await?;
//!
//!     let height: u64 = client.call("ChainHead", vec![]).await?;
//!     println!("height: {}", height);
//!
//!     client.on_notification(|push| {
//!         println!("daemon push: {}", push.method);
//!     });
//!
//!     Ok(())
//! }
//! ```
//!
//! # Supervised connection
//!
//! ```rust,no_run
//! use webrpc_client::{ConnectionManager, ManagerConfig};
//!
//! # async fn example() -> webrpc_core::Result<()> {
//! let manager = ConnectionManager::start(ManagerConfig::default()).await?;
//!
//! let endpoint = manager
//!     .test_and_switch_endpoint("http://192.168.1.230:4701/")
//!     .await?;
//! assert_eq!(endpoint, manager.endpoint());
//! # Ok(())
//! # }
//! ```

mod client;
mod endpoint;
mod events;
mod manager;
mod metrics;
mod reconnect;
mod request;
mod storage;
mod transport;

pub use client::{ClientOptions, RpcClient};
pub use endpoint::{normalize_endpoint, DEFAULT_ENDPOINT, DEFAULT_RPC_PATH, HISTORY_LIMIT};
pub use manager::{
    CacheInvalidator, CallInterceptor, ConnectionManager, ConnectionStatus, EndpointProbe,
    ManagerConfig, WsProbe,
};
pub use metrics::ClientMetrics;
pub use reconnect::{ExponentialBackoff, MAX_RECONNECT_DELAY};
pub use storage::{EndpointStore, FileStore, MemoryStore};
