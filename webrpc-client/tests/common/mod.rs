//! Common test utilities for webrpc-client integration tests
//!
//! Provides a scripted mock WebSocket server so client behavior can be
//! exercised without a real daemon: JSON-RPC-aware responders, close-code
//! control per connection, and a connection counter for reconnect tests.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

type MockHandler =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = Vec<String>> + Send>> + Send + Sync>;

/// Mock WebSocket server for client testing
///
/// The handler receives each inbound text frame and returns zero or more
/// frames to send back. Handlers run on their own tasks, so a slow handler
/// never blocks other frames on the same connection.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    close_tx: broadcast::Sender<u16>,
    message_rx: mpsc::Receiver<String>,
    connections: Arc<AtomicUsize>,
}

impl MockWsServer {
    /// Server that answers every request with its own params as the result
    pub async fn echo() -> Self {
        Self::with_handler(|text| async move {
            let frame: serde_json::Value = match serde_json::from_str(&text) {
                Ok(frame) => frame,
                Err(_) => return vec![],
            };
            match frame.get("id").and_then(|id| id.as_u64()) {
                Some(id) => vec![mock_response(id, frame["params"].clone())],
                None => vec![],
            }
        })
        .await
    }

    /// Start a mock server with a custom frame handler
    pub async fn with_handler<F, Fut>(handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<String>> + Send + 'static,
    {
        let handler: MockHandler = Arc::new(move |text| Box::pin(handler(text)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut accept_shutdown) = broadcast::channel::<()>(1);
        let (close_tx, _) = broadcast::channel::<u16>(4);
        let (msg_tx, message_rx) = mpsc::channel::<String>(100);
        let connections = Arc::new(AtomicUsize::new(0));

        {
            let connections = Arc::clone(&connections);
            let close_tx = close_tx.clone();
            let shutdown_tx = shutdown_tx.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = accept_shutdown.recv() => break,
                        accepted = listener.accept() => {
                            let Ok((stream, _)) = accepted else { break };
                            connections.fetch_add(1, Ordering::SeqCst);
                            tokio::spawn(Self::serve_connection(
                                stream,
                                Arc::clone(&handler),
                                msg_tx.clone(),
                                close_tx.subscribe(),
                                shutdown_tx.subscribe(),
                            ));
                        }
                    }
                }
            });
        }

        // Give the accept loop a moment to be ready.
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        Self {
            addr,
            shutdown_tx,
            close_tx,
            message_rx,
            connections,
        }
    }

    async fn serve_connection(
        stream: tokio::net::TcpStream,
        handler: MockHandler,
        msg_tx: mpsc::Sender<String>,
        mut close_rx: broadcast::Receiver<u16>,
        mut kill_rx: broadcast::Receiver<()>,
    ) {
        let Ok(ws) = accept_async(stream).await else {
            return;
        };
        let (mut write, mut read) = ws.split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(32);

        loop {
            tokio::select! {
                // Abrupt teardown: drop the TCP stream with no close handshake.
                _ = kill_rx.recv() => return,
                code = close_rx.recv() => {
                    if let Ok(code) = code {
                        let _ = write
                            .send(Message::Close(Some(CloseFrame {
                                code: CloseCode::from(code),
                                reason: "".into(),
                            })))
                            .await;
                    }
                    return;
                }
                outbound = out_rx.recv() => {
                    if let Some(text) = outbound {
                        let _ = write.send(Message::Text(text)).await;
                    }
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let _ = msg_tx.send(text.clone()).await;
                            let handler = Arc::clone(&handler);
                            let out_tx = out_tx.clone();
                            tokio::spawn(async move {
                                for response in handler(text).await {
                                    let _ = out_tx.send(response).await;
                                }
                            });
                        }
                        Some(Ok(Message::Close(_))) | None => return,
                        Some(Ok(_)) => {}
                        Some(Err(_)) => return,
                    }
                }
            }
        }
    }

    /// WebSocket URL for connecting to this server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Next frame received by the server, or `None` after 5s
    pub async fn wait_for_message(&mut self) -> Option<String> {
        tokio::time::timeout(tokio::time::Duration::from_secs(5), self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Close every live connection with the given close code
    pub fn close_connections(&self, code: u16) {
        let _ = self.close_tx.send(code);
    }

    /// Stop accepting and drop every live connection without a close
    /// handshake (clients observe an abnormal disconnect)
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// A JSON-RPC success response frame
pub fn mock_response(id: u64, result: serde_json::Value) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id
    })
    .to_string()
}

/// A JSON-RPC error response frame
pub fn mock_error_response(id: u64, code: i32, message: &str, data: Option<serde_json::Value>) -> String {
    let mut error = serde_json::json!({
        "code": code,
        "message": message
    });
    if let Some(data) = data {
        error["data"] = data;
    }
    serde_json::json!({
        "jsonrpc": "2.0",
        "error": error,
        "id": id
    })
    .to_string()
}

/// A JSON-RPC notification frame (no id)
pub fn mock_notification(method: &str, params: serde_json::Value) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params
    })
    .to_string()
}

/// Extract (id, method) from a captured request frame
pub fn parse_request(text: &str) -> (u64, String) {
    let frame: serde_json::Value = serde_json::from_str(text).expect("request frame");
    (
        frame["id"].as_u64().expect("integer id"),
        frame["method"].as_str().expect("method").to_string(),
    )
}
