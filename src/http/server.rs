//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Build every handler from the immutable `ProxyConfig`
//! - Create the Axum router with a single catch-all handler
//! - Classify each request once and dispatch it to exactly one handler
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, FromRequestParts, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::gui_config::GuiConfig;
use crate::http::passthrough::HttpsPassthrough;
use crate::http::request::RequestSpan;
use crate::http::sandbox::StaticDelegate;
use crate::http::websocket::WebSocketTunnel;
use crate::lifecycle::ShutdownListener;
use crate::net::{backend_client_config, TlsError};
use crate::observability::metrics;
use crate::routing::{PathMatcher, Route};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<PathMatcher>,
    pub tunnel: Arc<WebSocketTunnel>,
    pub passthrough: Arc<HttpsPassthrough>,
    pub sandbox: Arc<StaticDelegate>,
    pub gui_config: Arc<GuiConfig>,
}

/// Error type for server construction.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("invalid controller address {0:?}")]
    ControllerAddress(String),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// HTTP server for the GUI proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, SetupError> {
        let matcher = PathMatcher::from_config(&config)
            .ok_or_else(|| SetupError::ControllerAddress(config.controller_addr.clone()))?;
        let tls = backend_client_config(&config.backend_tls)?;

        let state = AppState {
            matcher: Arc::new(matcher),
            tunnel: Arc::new(WebSocketTunnel::new(
                config.controller_addr.clone(),
                &config.origin(),
                tls.clone(),
            )?),
            passthrough: Arc::new(HttpsPassthrough::new(&config.controller_addr, tls)?),
            sandbox: Arc::new(StaticDelegate::new(&config.sandbox_url)?),
            gui_config: Arc::new(GuiConfig::from_config(&config)),
        };

        Ok(Self {
            router: Self::build_router(state),
            config: Arc::new(config),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(route_request))
            .route("/", any(route_request))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
    }

    /// Run the server until the shutdown listener resolves.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownListener,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            controller = %self.config.controller_addr,
            sandbox = %self.config.sandbox_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main handler: classify once, dispatch once.
async fn route_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();

    let Some(route) = state.matcher.match_path(&path) else {
        let err = ProxyError::Routing { path };
        tracing::error!(error = %err, "Routing invariant violated");
        return err.into_response();
    };
    let kind = route.kind();
    tracing::debug!(route = kind, "Route matched");

    let result = match route {
        Route::ControllerSocket { backend_path } | Route::WorkspaceSocket { backend_path, .. } => {
            open_tunnel(&state, request, kind, backend_path).await
        }
        Route::HttpsPassthrough { backend_path } => {
            state.passthrough.forward(request, &backend_path).await
        }
        Route::ConfigDocument => Ok(state.gui_config.response()),
        Route::StaticAsset => state.sandbox.forward(request).await,
    };

    let response = result.unwrap_or_else(|err| {
        match &err {
            ProxyError::UpgradeRequired { .. } => tracing::info!(error = %err, "Rejected request"),
            _ => tracing::warn!(error = %err, "Request failed"),
        }
        err.into_response()
    });

    metrics::record_request(kind, response.status().as_u16(), start);
    response
}

/// Dial the controller, then accept the client upgrade and relay.
async fn open_tunnel(
    state: &AppState,
    request: Request<Body>,
    kind: &'static str,
    backend_path: String,
) -> Result<Response, ProxyError> {
    let (mut parts, _body) = request.into_parts();
    let path = parts.uri.path().to_string();
    let upgrade = WebSocketUpgrade::from_request_parts(&mut parts, state)
        .await
        .map_err(|rejection| ProxyError::UpgradeRequired {
            path,
            reason: rejection.body_text(),
        })?;

    let backend = state.tunnel.connect(&backend_path).await?;
    tracing::info!(route = kind, backend_path = %backend_path, "Tunnel established");

    Ok(upgrade
        .on_failed_upgrade(|e| tracing::warn!(error = %e, "Client upgrade failed"))
        .on_upgrade(move |socket| async move {
            metrics::tunnel_opened(kind);
            let end = WebSocketTunnel::relay(socket, backend).await;
            tracing::debug!(route = kind, end = %end, "Tunnel closed");
            metrics::tunnel_closed(end.as_str());
        }))
}
