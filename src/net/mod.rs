//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound controller connection
//!     → tls.rs (shared rustls ClientConfig)
//!     → WebSocket tunnel dial / HTTPS passthrough connector
//! ```
//!
//! # Design Decisions
//! - One ClientConfig built at startup and shared by every outbound connection
//! - Inbound TLS is not terminated here
//! - Chain verification is skipped by default (self-signed controllers)

pub mod tls;

pub use tls::{backend_client_config, TlsError};
