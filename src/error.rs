//! Request-path error types.
//!
//! Every variant is surfaced to the original caller as an HTTP status;
//! none of them is fatal to the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised while routing or forwarding a single request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The path matched no rule, not even the catch-all.
    #[error("no route for path {path:?}")]
    Routing { path: String },

    /// A socket route was hit without a WebSocket upgrade.
    #[error("websocket upgrade required for {path}: {reason}")]
    UpgradeRequired { path: String, reason: String },

    /// The backend answered the WebSocket handshake with something other than 101.
    #[error("backend rejected websocket handshake for {url} with status {status}")]
    HandshakeRejected { url: String, status: u16 },

    /// Connect or TLS failure talking to the controller.
    #[error("backend unreachable at {target}: {reason}")]
    BackendUnreachable { target: String, reason: String },

    /// Connect failure talking to the sandbox GUI.
    #[error("sandbox unreachable at {target}: {reason}")]
    SandboxUnreachable { target: String, reason: String },

    /// A forwarding URI could not be built.
    #[error("invalid forwarding target: {0}")]
    InvalidTarget(String),
}

impl ProxyError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Routing { .. } | ProxyError::InvalidTarget(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::UpgradeRequired { .. } => StatusCode::BAD_REQUEST,
            ProxyError::HandshakeRejected { .. }
            | ProxyError::BackendUnreachable { .. }
            | ProxyError::SandboxUnreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
