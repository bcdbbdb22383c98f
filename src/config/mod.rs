//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → args.rs (environment preset, then command line flags)
//!     → overrides.rs (GUI config overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once assembled; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod overrides;
pub mod presets;
pub mod schema;
pub mod validation;

pub use args::Cli;
pub use loader::{load_config, ConfigError};
pub use schema::{BackendTlsConfig, ListenerConfig, ObservabilityConfig, ProxyConfig};
