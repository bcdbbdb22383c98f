//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → matcher.rs (structural classification)
//!     → Route { ControllerSocket | WorkspaceSocket | HttpsPassthrough
//!              | ConfigDocument | StaticAsset } or NoMatch
//! ```
//!
//! # Design Decisions
//! - Matcher built once at startup, immutable at runtime
//! - No regex in hot path (prefix and segment matching only)
//! - Deterministic: same input always matches same route
//! - Static assets are the catch-all, so NoMatch is an invariant violation

pub mod matcher;

pub use matcher::{BackendAddr, PathMatcher, Route};
