//! GUI sandbox proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                  GUI PROXY                   │
//!   Sandbox GUI          │                                              │
//!   (browser)            │  ┌────────┐    ┌─────────┐                   │
//!   ─────────────────────┼─▶│  http  │───▶│ routing │                   │
//!                        │  │ server │    │ matcher │                   │
//!                        │  └────────┘    └────┬────┘                   │
//!                        │                     │                        │
//!                        │      ┌──────────────┼──────────────┐         │
//!                        │      ▼              ▼              ▼         │
//!                        │ ┌─────────┐  ┌─────────────┐  ┌─────────┐    │     Controller
//!                        │ │websocket│  │ passthrough │  │ sandbox │    │     (self-signed
//!                        │ │ tunnel  │  │   (https)   │  │ + config│    │      TLS)
//!                        │ └────┬────┘  └──────┬──────┘  └─────────┘    │
//!                        │      └───── wss / https ─────────────────────┼────▶
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;

use guiproxy::config::Cli;
use guiproxy::lifecycle::{signals, Shutdown};
use guiproxy::observability::{logging, metrics};
use guiproxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cannot parse configuration options: {}", e);
            std::process::exit(2);
        }
    };

    logging::init_logging(&config.observability);
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "guiproxy starting");
    tracing::info!(
        sandbox = %config.sandbox_url,
        controller = %config.controller_addr,
        legacy = config.legacy_mode,
        uuid = config.model_uuid().unwrap_or("-"),
        gui_config_customized = !config.gui_overrides.is_empty(),
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address"),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        "visit the GUI at http://{}/",
        listener.local_addr()?
    );

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let listener_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, listener_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
