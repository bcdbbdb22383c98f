//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the controller address splits into host and numeric port
//! - Check the sandbox URL is a plain http URL
//! - Check a CA bundle is given when backend verification is enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::routing::BackendAddr;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("controller address is required")]
    MissingController,

    #[error("invalid controller address {0:?}: expected host:port")]
    ControllerAddress(String),

    #[error("invalid sandbox URL {0:?}")]
    SandboxUrl(String),

    #[error("backend TLS verification requires a CA certificate")]
    MissingCaCert,
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.controller_addr.is_empty() {
        errors.push(ValidationError::MissingController);
    } else if BackendAddr::parse(&config.controller_addr).is_none() {
        errors.push(ValidationError::ControllerAddress(
            config.controller_addr.clone(),
        ));
    }

    let sandbox_ok = Url::parse(&config.sandbox_url)
        .map(|url| url.scheme() == "http" && url.host_str().is_some())
        .unwrap_or(false);
    if !sandbox_ok {
        errors.push(ValidationError::SandboxUrl(config.sandbox_url.clone()));
    }

    if !config.backend_tls.skip_verify && config.backend_tls.ca_cert.is_none() {
        errors.push(ValidationError::MissingCaCert);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
