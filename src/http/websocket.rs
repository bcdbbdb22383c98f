//! WebSocket tunnel to the controller.
//!
//! # Responsibilities
//! - Dial the controller over TLS, presenting the configured Origin
//! - Complete the controller handshake before accepting the client upgrade
//! - Bidirectional frame forwarding
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket frames ────→ Proxy ←──── WebSocket frames (wss) ────→ Controller
//! ```
//!
//! # Design Decisions
//! - One task per direction, each owning one read half and one write half
//! - Message-level forwarding (no buffering beyond one message)
//! - Close frames propagated in both directions
//! - Ping/pong answered by each hop, not forwarded
//! - Either direction ending tears down both sockets

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame as AxumCloseFrame, Message as AxumMessage, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as WsCloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};

use crate::error::ProxyError;

/// How long a closing tunnel waits for the peer's close reply.
pub const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Established WebSocket connection to the controller.
pub type BackendSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a tunnel session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEnd {
    /// The client sent a close frame or hung up.
    ClientClosed,
    /// The controller sent a close frame or hung up.
    BackendClosed,
    /// Reading from or writing to the client failed.
    ClientFailed(String),
    /// Reading from or writing to the controller failed.
    BackendFailed(String),
}

impl RelayEnd {
    /// Whether the session ended with a close frame rather than an error.
    pub fn is_clean(&self) -> bool {
        matches!(self, RelayEnd::ClientClosed | RelayEnd::BackendClosed)
    }

    /// Short name used in metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayEnd::ClientClosed => "client_closed",
            RelayEnd::BackendClosed => "backend_closed",
            RelayEnd::ClientFailed(_) => "client_failed",
            RelayEnd::BackendFailed(_) => "backend_failed",
        }
    }
}

impl fmt::Display for RelayEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayEnd::ClientFailed(reason) => write!(f, "client failed: {}", reason),
            RelayEnd::BackendFailed(reason) => write!(f, "backend failed: {}", reason),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Dials the controller and relays frames for one session at a time.
#[derive(Clone)]
pub struct WebSocketTunnel {
    controller_addr: String,
    origin: HeaderValue,
    tls: Arc<rustls::ClientConfig>,
}

impl WebSocketTunnel {
    pub fn new(
        controller_addr: impl Into<String>,
        origin: &str,
        tls: Arc<rustls::ClientConfig>,
    ) -> Result<Self, ProxyError> {
        let origin = HeaderValue::from_str(origin)
            .map_err(|e| ProxyError::InvalidTarget(format!("origin {:?}: {}", origin, e)))?;
        Ok(Self {
            controller_addr: controller_addr.into(),
            origin,
            tls,
        })
    }

    /// Controller URL for a synthesized path.
    pub fn backend_url(&self, backend_path: &str) -> String {
        format!("wss://{}{}", self.controller_addr, backend_path)
    }

    /// Open the controller side of a tunnel.
    pub async fn connect(&self, backend_path: &str) -> Result<BackendSocket, ProxyError> {
        let url = self.backend_url(backend_path);
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", url, e)))?;
        request.headers_mut().insert(ORIGIN, self.origin.clone());

        let connector = Connector::Rustls(self.tls.clone());
        let (socket, response) = connect_async_tls_with_config(request, None, false, Some(connector))
            .await
            .map_err(|e| match e {
                WsError::Http(response) => ProxyError::HandshakeRejected {
                    url: url.clone(),
                    status: response.status().as_u16(),
                },
                other => ProxyError::BackendUnreachable {
                    target: url.clone(),
                    reason: other.to_string(),
                },
            })?;

        tracing::debug!(url = %url, status = %response.status(), "Controller socket connected");
        Ok(socket)
    }

    /// Relay frames until either side ends the session.
    ///
    /// After a close frame is forwarded, the other direction gets
    /// [`CLOSE_GRACE`] to carry the peer's close reply back before it is
    /// aborted. Returns once both directions have stopped; both sockets are
    /// dropped by then.
    pub async fn relay(inbound: WebSocket, backend: BackendSocket) -> RelayEnd {
        let (client_tx, client_rx) = inbound.split();
        let (backend_tx, backend_rx) = backend.split();

        let mut upstream = tokio::spawn(client_to_backend(client_rx, backend_tx));
        let mut downstream = tokio::spawn(backend_to_client(backend_rx, client_tx));

        let (finished, mut remaining) = tokio::select! {
            end = &mut upstream => (end, downstream),
            end = &mut downstream => (end, upstream),
        };
        let end = finished
            .unwrap_or_else(|e| RelayEnd::BackendFailed(format!("relay task failed: {}", e)));

        let drained = end.is_clean()
            && tokio::time::timeout(CLOSE_GRACE, &mut remaining).await.is_ok();
        if !drained {
            remaining.abort();
            let _ = remaining.await;
        }

        end
    }
}

async fn client_to_backend(
    mut source: SplitStream<WebSocket>,
    mut sink: SplitSink<BackendSocket, WsMessage>,
) -> RelayEnd {
    while let Some(frame) = source.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                let _ = sink.close().await;
                return RelayEnd::ClientFailed(e.to_string());
            }
        };
        let closing = matches!(message, AxumMessage::Close(_));
        let Some(forward) = to_backend(message) else {
            continue;
        };
        if let Err(e) = sink.send(forward).await {
            return RelayEnd::BackendFailed(e.to_string());
        }
        if closing {
            return RelayEnd::ClientClosed;
        }
    }
    let _ = sink.close().await;
    RelayEnd::ClientClosed
}

async fn backend_to_client(
    mut source: SplitStream<BackendSocket>,
    mut sink: SplitSink<WebSocket, AxumMessage>,
) -> RelayEnd {
    while let Some(frame) = source.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                let _ = sink.close().await;
                return RelayEnd::BackendFailed(e.to_string());
            }
        };
        let closing = matches!(message, WsMessage::Close(_));
        let Some(forward) = to_client(message) else {
            continue;
        };
        if let Err(e) = sink.send(forward).await {
            return RelayEnd::ClientFailed(e.to_string());
        }
        if closing {
            return RelayEnd::BackendClosed;
        }
    }
    let _ = sink.close().await;
    RelayEnd::BackendClosed
}

fn to_backend(message: AxumMessage) -> Option<WsMessage> {
    match message {
        AxumMessage::Text(text) => Some(WsMessage::Text(text.as_str().into())),
        AxumMessage::Binary(data) => Some(WsMessage::Binary(data)),
        AxumMessage::Close(frame) => Some(WsMessage::Close(frame.map(|f| WsCloseFrame {
            code: CloseCode::from(f.code),
            reason: f.reason.as_str().into(),
        }))),
        AxumMessage::Ping(_) | AxumMessage::Pong(_) => None,
    }
}

fn to_client(message: WsMessage) -> Option<AxumMessage> {
    match message {
        WsMessage::Text(text) => Some(AxumMessage::Text(text.as_str().into())),
        WsMessage::Binary(data) => Some(AxumMessage::Binary(data)),
        WsMessage::Close(frame) => Some(AxumMessage::Close(frame.map(|f| AxumCloseFrame {
            code: u16::from(f.code),
            reason: f.reason.as_str().into(),
        }))),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn tunnel() -> WebSocketTunnel {
        let tls = crate::net::backend_client_config(&Default::default()).unwrap();
        WebSocketTunnel::new("127.0.0.1:9999", "http://0.0.0.0:8042", tls).unwrap()
    }

    #[test]
    fn test_backend_url() {
        assert_eq!(
            tunnel().backend_url("/model/127.0.0.1/9999/abc-123/model-api"),
            "wss://127.0.0.1:9999/model/127.0.0.1/9999/abc-123/model-api"
        );
    }

    #[test]
    fn test_invalid_origin() {
        let tls = crate::net::backend_client_config(&Default::default()).unwrap();
        let result = WebSocketTunnel::new("127.0.0.1:9999", "http://bad\norigin", tls);
        assert!(matches!(result, Err(ProxyError::InvalidTarget(_))));
    }

    #[test]
    fn test_text_and_binary_are_unchanged() {
        let text = r#"{"request":"ping"}"#;
        match to_backend(AxumMessage::Text(text.into())) {
            Some(WsMessage::Text(forwarded)) => assert_eq!(forwarded.as_str(), text),
            other => panic!("unexpected {:?}", other),
        }

        let payload = Bytes::from_static(&[0, 159, 146, 150, 255]);
        match to_client(WsMessage::Binary(payload.clone())) {
            Some(AxumMessage::Binary(forwarded)) => assert_eq!(forwarded, payload),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_close_code_is_kept() {
        let close = AxumMessage::Close(Some(AxumCloseFrame {
            code: 4000,
            reason: "bye".into(),
        }));
        match to_backend(close) {
            Some(WsMessage::Close(Some(frame))) => {
                assert_eq!(u16::from(frame.code), 4000);
                assert_eq!(frame.reason.as_str(), "bye");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_only_close_frames_end_cleanly() {
        assert!(RelayEnd::ClientClosed.is_clean());
        assert!(RelayEnd::BackendClosed.is_clean());
        assert!(!RelayEnd::ClientFailed("reset".into()).is_clean());
        assert!(!RelayEnd::BackendFailed("reset".into()).is_clean());
    }

    #[test]
    fn test_control_frames_stay_local() {
        assert!(to_backend(AxumMessage::Ping(Bytes::new())).is_none());
        assert!(to_client(WsMessage::Pong(Bytes::new())).is_none());
    }

    #[tokio::test]
    async fn test_connect_unreachable() {
        // Port 9 (discard) is not listening on loopback in test environments.
        let tls = crate::net::backend_client_config(&Default::default()).unwrap();
        let tunnel = WebSocketTunnel::new("127.0.0.1:9", "http://0.0.0.0:8042", tls).unwrap();
        let err = tunnel.connect("/api").await.unwrap_err();
        assert!(matches!(err, ProxyError::BackendUnreachable { .. }));
    }
}
