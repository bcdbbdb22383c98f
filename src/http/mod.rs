//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route classification, dispatch)
//!     → websocket.rs   /api, /model/{uuid}/api   → wss:// controller
//!     → passthrough.rs /juju-core/{path...}      → https:// controller
//!     → gui_config.rs  /config.js                → generated document
//!     → sandbox.rs     everything else           → sandbox GUI
//! ```

pub mod gui_config;
pub mod passthrough;
pub mod request;
pub mod sandbox;
pub mod server;
pub mod websocket;

pub use request::{RequestId, RequestSpan};
pub use server::{HttpServer, SetupError};
