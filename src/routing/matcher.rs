//! Path classification.
//!
//! # Responsibilities
//! - Classify an inbound path into exactly one [`Route`]
//! - Synthesize the controller-side path for socket and HTTPS routes
//!
//! # Design Decisions
//! - Structural matching on `/`-separated segments, no regex
//! - Specific rules are checked before the static asset catch-all
//! - Model UUIDs are opaque: only emptiness is rejected

use crate::config::schema::ProxyConfig;

/// Prefix of paths forwarded verbatim to the controller HTTPS API.
pub const HTTPS_PREFIX: &str = "/juju-core/";

/// Path serving the generated GUI configuration.
pub const CONFIG_PATH: &str = "/config.js";

/// Path of the controller WebSocket API.
pub const CONTROLLER_PATH: &str = "/api";

/// Controller address split into host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddr {
    pub host: String,
    pub port: u16,
}

impl BackendAddr {
    /// Split "host:port" at the last colon. IPv6 brackets are stripped from the host.
    pub fn parse(addr: &str) -> Option<Self> {
        let (host, port) = addr.rsplit_once(':')?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return None;
        }
        let port = port.parse().ok()?;
        Some(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Controller-side path of the controller API.
    pub fn controller_path(&self) -> String {
        format!("/controller/{}/{}/controller-api", self.host, self.port)
    }

    /// Controller-side path of a model API.
    pub fn model_path(&self, uuid: &str) -> String {
        format!("/model/{}/{}/{}/model-api", self.host, self.port, uuid)
    }
}

/// Routing decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// WebSocket session with the controller API.
    ControllerSocket { backend_path: String },
    /// WebSocket session with a model API.
    WorkspaceSocket { uuid: String, backend_path: String },
    /// Single request forwarded to the controller HTTPS API.
    HttpsPassthrough { backend_path: String },
    /// Anything served by the sandbox GUI.
    StaticAsset,
    /// The generated `config.js`.
    ConfigDocument,
}

impl Route {
    /// Short name used in logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Route::ControllerSocket { .. } => "controller_socket",
            Route::WorkspaceSocket { .. } => "workspace_socket",
            Route::HttpsPassthrough { .. } => "https_passthrough",
            Route::StaticAsset => "static_asset",
            Route::ConfigDocument => "config_document",
        }
    }
}

/// Maps request paths to routes. Immutable after construction.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    backend: BackendAddr,
    legacy_mode: bool,
    uuid_hint: Option<String>,
}

impl PathMatcher {
    pub fn new(backend: BackendAddr, legacy_mode: bool, uuid_hint: Option<String>) -> Self {
        Self {
            backend,
            legacy_mode,
            uuid_hint: uuid_hint.filter(|uuid| !uuid.is_empty()),
        }
    }

    /// Build a matcher from a validated configuration.
    pub fn from_config(config: &ProxyConfig) -> Option<Self> {
        let backend = BackendAddr::parse(&config.controller_addr)?;
        Some(Self::new(
            backend,
            config.legacy_mode,
            config.model_uuid().map(str::to_string),
        ))
    }

    /// Classify a request path (without query). `None` only for paths
    /// that do not start with `/`.
    pub fn match_path(&self, path: &str) -> Option<Route> {
        if !path.starts_with('/') {
            return None;
        }

        if path == CONTROLLER_PATH {
            return Some(self.controller_route());
        }

        if let Some(uuid) = model_uuid(path) {
            return Some(Route::WorkspaceSocket {
                backend_path: self.backend.model_path(uuid),
                uuid: uuid.to_string(),
            });
        }

        if let Some(rest) = path.strip_prefix(HTTPS_PREFIX) {
            return Some(Route::HttpsPassthrough {
                backend_path: format!("/{}", rest),
            });
        }

        if path == CONFIG_PATH {
            return Some(Route::ConfigDocument);
        }

        Some(Route::StaticAsset)
    }

    fn controller_route(&self) -> Route {
        if !self.legacy_mode {
            return Route::ControllerSocket {
                backend_path: self.backend.controller_path(),
            };
        }
        // Legacy controllers only expose the model they were started with.
        match &self.uuid_hint {
            Some(uuid) => Route::WorkspaceSocket {
                backend_path: self.backend.model_path(uuid),
                uuid: uuid.clone(),
            },
            None => Route::ControllerSocket {
                backend_path: CONTROLLER_PATH.to_string(),
            },
        }
    }
}

/// Extract `<uuid>` from `/model/<uuid>/api`.
fn model_uuid(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/model/")?;
    let uuid = rest.strip_suffix("/api")?;
    if uuid.is_empty() || uuid.contains('/') {
        return None;
    }
    Some(uuid)
}
