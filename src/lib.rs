//! GUI sandbox proxy library.
//!
//! Lets a GUI running in sandbox mode talk to a real controller and its
//! models as if they were served from a single local origin.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
