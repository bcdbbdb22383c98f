//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits so they can be loaded from a TOML file and
//! then refined by command line flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default port the proxy listens on.
pub const DEFAULT_PORT: u16 = 8042;

/// Default address of the GUI running in sandbox mode.
pub const DEFAULT_SANDBOX_URL: &str = "http://localhost:6543";

/// Root configuration for the GUI proxy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Controller address as "host:port".
    pub controller_addr: String,

    /// Origin presented to the controller on WebSocket handshakes.
    /// Empty means "derive from the listening port".
    pub origin_addr: String,

    /// Base URL of the GUI running in sandbox mode.
    pub sandbox_url: String,

    /// Talk to a legacy controller.
    pub legacy_mode: bool,

    /// Fixed model UUID used by legacy controllers and advertised to the GUI.
    pub uuid_hint: Option<String>,

    /// Fields merged over the generated GUI configuration.
    pub gui_overrides: Map<String, Value>,

    /// Outbound TLS settings for controller connections.
    pub backend_tls: BackendTlsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            controller_addr: String::new(),
            origin_addr: String::new(),
            sandbox_url: DEFAULT_SANDBOX_URL.to_string(),
            legacy_mode: false,
            uuid_hint: None,
            gui_overrides: Map::new(),
            backend_tls: BackendTlsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Origin header value, falling back to the listening address.
    pub fn origin(&self) -> String {
        if self.origin_addr.is_empty() {
            format!("http://0.0.0.0:{}", self.listener.port())
        } else {
            self.origin_addr.clone()
        }
    }

    /// The UUID hint, ignoring empty strings.
    pub fn model_uuid(&self) -> Option<&str> {
        self.uuid_hint.as_deref().filter(|uuid| !uuid.is_empty())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8042").
    pub bind_address: String,
}

impl ListenerConfig {
    /// Port of the bind address, or the default port if it does not parse.
    pub fn port(&self) -> u16 {
        self.bind_address
            .parse::<SocketAddr>()
            .map(|addr| addr.port())
            .unwrap_or(DEFAULT_PORT)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: format!("0.0.0.0:{}", DEFAULT_PORT),
        }
    }
}

/// TLS settings for connections to the controller.
///
/// Controllers ship self-signed certificates, so verification is skipped
/// unless explicitly enabled with a trusted CA bundle.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackendTlsConfig {
    /// Accept any certificate presented by the controller.
    pub skip_verify: bool,

    /// PEM bundle trusted when verification is enabled.
    pub ca_cert: Option<PathBuf>,
}

impl Default for BackendTlsConfig {
    fn default() -> Self {
        Self {
            skip_verify: true,
            ca_cert: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Disable ANSI colours in log output.
    pub no_color: bool,

    /// Prometheus exporter bind address, disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            no_color: false,
            metrics_address: None,
        }
    }
}
