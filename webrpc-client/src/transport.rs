//! WebSocket transport adapter
//!
//! Owns the socket plumbing and nothing else: connecting, splitting the
//! stream, building close frames, and classifying how a connection ended.
//! Retry decisions live in the client's receive loop, not here.

use futures::stream::{SplitSink, SplitStream};
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use webrpc_core::{Error, Result};

pub(crate) type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsConnection, Message>;
pub(crate) type WsStream = SplitStream<WsConnection>;

/// Open a WebSocket connection and split it into sink and stream halves
pub(crate) async fn connect(url: &str) -> Result<(WsSink, WsStream)> {
    let (ws_stream, _) = connect_async(url)
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))?;
    Ok(ws_stream.split())
}

/// A normal-closure close frame (code 1000)
pub(crate) fn close_frame() -> Message {
    Message::Close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    }))
}

/// How a connection ended
///
/// A clean close (code 1000) means the peer or this side finished the
/// session deliberately and must never trigger a reconnect. Everything else
/// is abnormal: a non-1000 close code, a protocol error, or the TCP stream
/// ending without a closing handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Disconnect {
    Clean,
    Abnormal(Option<u16>),
}

impl Disconnect {
    pub(crate) fn from_close_frame(frame: Option<CloseFrame<'static>>) -> Self {
        match frame {
            Some(f) if u16::from(f.code) == 1000 => Disconnect::Clean,
            Some(f) => Disconnect::Abnormal(Some(u16::from(f.code))),
            None => Disconnect::Abnormal(None),
        }
    }

    pub(crate) fn is_clean(&self) -> bool {
        matches!(self, Disconnect::Clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_close_is_clean() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        assert!(Disconnect::from_close_frame(Some(frame)).is_clean());
    }

    #[test]
    fn test_other_codes_are_abnormal() {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "".into(),
        };
        assert_eq!(
            Disconnect::from_close_frame(Some(frame)),
            Disconnect::Abnormal(Some(1001))
        );
    }

    #[test]
    fn test_missing_frame_is_abnormal() {
        assert_eq!(Disconnect::from_close_frame(None), Disconnect::Abnormal(None));
    }
}
