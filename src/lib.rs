//! WEBRPC - JSON-RPC 2.0 over WebSocket for the cluster daemon
//!
//! This is the main convenience crate that re-exports all webrpc sub-crates.
//! Use this crate if you want a single dependency that provides the wire
//! types, the RPC client, and the connection manager.
//!
//! # Architecture
//!
//! webrpc is organized into modular crates:
//!
//! - **webrpc-core**: Core JSON-RPC 2.0 types, codec, error handling
//! - **webrpc-client**: WebSocket JSON-RPC client with reconnection and
//!   endpoint supervision
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use webrpc::{ClientOptions, RpcClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions::new("ws://localhost:4701/api/webrpc/v0");
//!     let client = RpcClient::new(options);
//!     client.connect().await?;
//!
//!     let version: String = client.call("Version", vec![]).await?;
//!     println!("daemon version: {}", version);
//!
//!     Ok(())
//! }
//! ```
//!
//! # With a supervised connection
//!
//! ```rust,no_run
//! use webrpc::{ConnectionManager, ManagerConfig};
//!
//! # async fn example() -> webrpc_core::Result<()> {
//! let manager = ConnectionManager::start(ManagerConfig::default()).await?;
//!
//! // Hot-swap the endpoint; history and status survive the swap.
//! let endpoint = manager
//!     .test_and_switch_endpoint("http://192.168.1.230:4701/")
//!     .await?;
//! println!("now talking to {}", endpoint);
//! # Ok(())
//! # }
//! ```

// Re-export all public APIs from sub-crates
// This allows users to access everything through the `webrpc::` prefix
pub use webrpc_client as client;
pub use webrpc_core as core;

// Convenience re-exports of the most commonly used types
pub use webrpc_client::{
    ClientOptions, ConnectionManager, ConnectionStatus, ManagerConfig, RpcClient,
};
