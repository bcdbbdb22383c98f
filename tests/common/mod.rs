//! Shared utilities for integration testing.
//!
//! Starts a fake controller (self-signed TLS, WebSocket echo + HTTPS echo),
//! a fake sandbox GUI (plain HTTP) and the proxy itself, all on ephemeral
//! ports.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header::ORIGIN, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use guiproxy::{HttpServer, ProxyConfig, Shutdown};

/// Message making the fake controller close the socket.
pub const CLOSE_REQUEST: &str = "__close__";

/// Model UUID the fake controller refuses to upgrade.
pub const FORBIDDEN_UUID: &str = "forbidden";

/// A WebSocket handshake observed by the fake controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub path: String,
    pub origin: Option<String>,
}

/// How a controller-side socket ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEnd {
    /// Close code and reason received from the proxy, if any.
    pub close: Option<(u16, String)>,
}

/// Running fake controller.
pub struct Controller {
    pub addr: SocketAddr,
    pub handshakes: mpsc::UnboundedReceiver<Handshake>,
    pub endings: mpsc::UnboundedReceiver<SocketEnd>,
}

#[derive(Clone)]
struct ControllerState {
    handshakes: mpsc::UnboundedSender<Handshake>,
    endings: mpsc::UnboundedSender<SocketEnd>,
}

impl Controller {
    /// Next handshake seen by the controller.
    pub async fn next_handshake(&mut self) -> Handshake {
        tokio::time::timeout(Duration::from_secs(5), self.handshakes.recv())
            .await
            .expect("no handshake observed")
            .expect("controller stopped")
    }

    /// Next socket the controller saw end.
    pub async fn next_ending(&mut self) -> SocketEnd {
        tokio::time::timeout(Duration::from_secs(5), self.endings.recv())
            .await
            .expect("controller socket still open")
            .expect("controller stopped")
    }
}

/// Running proxy with its collaborators.
pub struct Harness {
    pub proxy_addr: SocketAddr,
    pub controller: Controller,
    pub sandbox_addr: SocketAddr,
    shutdown: Shutdown,
}

impl Harness {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.proxy_addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.proxy_addr, path)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the fake controller, the fake sandbox and a proxy wired to both.
pub async fn start() -> Harness {
    start_with(|_| {}).await
}

/// Like [`start`], letting the test adjust the proxy configuration.
pub async fn start_with(adjust: impl FnOnce(&mut ProxyConfig)) -> Harness {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let controller = start_controller().await;
    let sandbox_addr = start_sandbox().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();

    let mut config = ProxyConfig::default();
    config.listener.bind_address = proxy_addr.to_string();
    config.controller_addr = controller.addr.to_string();
    config.origin_addr = "http://1.2.3.4:4242".to_string();
    config.sandbox_url = format!("http://{}", sandbox_addr);
    config.uuid_hint = Some("example-uuid".to_string());
    adjust(&mut config);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let listener_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, listener_shutdown).await;
    });

    Harness {
        proxy_addr,
        controller,
        sandbox_addr,
        shutdown,
    }
}

/// Start a TLS controller with a freshly generated self-signed certificate.
pub async fn start_controller() -> Controller {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let tls = RustlsConfig::from_pem(
        certified.cert.pem().into_bytes(),
        certified.signing_key.serialize_pem().into_bytes(),
    )
    .await
    .unwrap();

    let (handshakes_tx, handshakes) = mpsc::unbounded_channel();
    let (endings_tx, endings) = mpsc::unbounded_channel();
    let state = ControllerState {
        handshakes: handshakes_tx,
        endings: endings_tx,
    };
    let app = Router::new()
        .route(
            "/controller/{host}/{port}/controller-api",
            any(controller_socket),
        )
        .route("/model/{host}/{port}/{uuid}/model-api", any(model_socket))
        .fallback(https_echo)
        .with_state(state);

    let handle = axum_server::Handle::new();
    let server = axum_server::bind_rustls("127.0.0.1:0".parse().unwrap(), tls).handle(handle.clone());
    tokio::spawn(async move {
        let _ = server.serve(app.into_make_service()).await;
    });
    let addr = handle.listening().await.expect("controller failed to start");

    Controller {
        addr,
        handshakes,
        endings,
    }
}

async fn controller_socket(
    State(state): State<ControllerState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
    request_path: axum::http::Uri,
) -> Response {
    record(&state.handshakes, &request_path, &headers);
    ws.on_upgrade(move |socket| echo(socket, state.endings))
}

async fn model_socket(
    State(state): State<ControllerState>,
    Path((_host, _port, uuid)): Path<(String, String, String)>,
    headers: HeaderMap,
    request_path: axum::http::Uri,
    ws: WebSocketUpgrade,
) -> Response {
    record(&state.handshakes, &request_path, &headers);
    if uuid == FORBIDDEN_UUID {
        return (StatusCode::FORBIDDEN, "model access denied").into_response();
    }
    ws.on_upgrade(move |socket| echo(socket, state.endings))
}

fn record(tx: &mpsc::UnboundedSender<Handshake>, uri: &axum::http::Uri, headers: &HeaderMap) {
    let _ = tx.send(Handshake {
        path: uri.path().to_string(),
        origin: headers
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
}

/// Repeat every data message; close on request.
///
/// Keeps reading after a close frame so the close reply is flushed, then
/// reports how the socket ended.
async fn echo(mut socket: WebSocket, endings: mpsc::UnboundedSender<SocketEnd>) {
    let mut close = None;
    while let Some(Ok(message)) = socket.next().await {
        match message {
            Message::Text(ref text) if text.as_str() == CLOSE_REQUEST => {
                if socket.send(Message::Close(None)).await.is_err() {
                    break;
                }
            }
            Message::Text(_) | Message::Binary(_) => {
                if socket.send(message).await.is_err() {
                    break;
                }
            }
            Message::Close(frame) => {
                close = frame.map(|f| (f.code, f.reason.as_str().to_string()));
            }
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
    let _ = endings.send(SocketEnd { close });
}

/// Describe the received request as JSON.
async fn https_echo(request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    if parts.uri.path() == "/teapot" {
        return (StatusCode::IM_A_TEAPOT, "short and stout").into_response();
    }
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "host": parts.headers.get("host").and_then(|v| v.to_str().ok()),
        "x-test": parts.headers.get("x-test").and_then(|v| v.to_str().ok()),
        "body": String::from_utf8_lossy(&body),
    }))
    .into_response()
}

/// Start a plain HTTP sandbox answering "gui: <path>".
pub async fn start_sandbox() -> SocketAddr {
    let app = Router::new().fallback(|request: Request<Body>| async move {
        format!("gui: {}", request.uri().path())
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
