//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every ShutdownListener resolves → server stops accepting
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Listeners created after the trigger still observe it
//! - Open tunnels are not drained; clients reconnect on their own

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
