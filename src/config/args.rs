//! Command line interface.
//!
//! Flags are layered over an optional TOML file:
//! defaults < config file < `--env` preset < explicit flags.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::overrides::{merge_overrides, parse_overrides};
use crate::config::presets;
use crate::config::schema::ProxyConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "guiproxy", version)]
#[command(
    about = "Proxies WebSocket and HTTPS requests from the GUI sandbox to a controller",
    long_about = None
)]
pub struct Cli {
    /// GUI proxy server port [default: 8042]
    #[arg(long)]
    pub port: Option<u16>,

    /// Address on which the GUI in sandbox mode is listening [default: http://localhost:6543]
    #[arg(long)]
    pub gui: Option<String>,

    /// Controller address, for instance jimm.jujucharms.com:443
    #[arg(long)]
    pub controller: Option<String>,

    /// Model UUID advertised to the GUI (required by legacy controllers)
    #[arg(long)]
    pub uuid: Option<String>,

    /// Override or extend fields in the GUI configuration, for instance
    /// 'gisf: true, charmstoreURL: "https://1.2.3.4/cs"'
    #[arg(long = "config")]
    pub gui_config: Option<String>,

    /// Select a predefined environment (production, qa, staging)
    #[arg(long)]
    pub env: Option<String>,

    /// Connect to a legacy controller
    #[arg(long)]
    pub juju1: bool,

    /// Do not use colors
    #[arg(long)]
    pub nocolor: bool,

    /// Verify the controller certificate against --ca-cert
    #[arg(long, requires = "ca_cert")]
    pub verify_backend_tls: bool,

    /// PEM bundle trusted when verifying the controller certificate
    #[arg(long)]
    pub ca_cert: Option<PathBuf>,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    pub metrics_address: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config_file: Option<PathBuf>,
}

impl Cli {
    /// Assemble and validate the proxy configuration.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(name) = &self.env {
            let env = presets::find(name)?;
            config.controller_addr = env.controller_addr.to_string();
            merge_overrides(&mut config.gui_overrides, env.gui_overrides()?);
        }

        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{}", port);
        }
        if let Some(gui) = self.gui {
            config.sandbox_url = normalize_gui_addr(&gui);
        }
        if let Some(controller) = self.controller {
            config.controller_addr = controller;
        }
        if let Some(uuid) = self.uuid {
            config.uuid_hint = Some(uuid);
        }
        if let Some(text) = &self.gui_config {
            merge_overrides(&mut config.gui_overrides, parse_overrides(text)?);
        }
        if self.juju1 {
            config.legacy_mode = true;
        }
        if self.nocolor {
            config.observability.no_color = true;
        }
        if self.verify_backend_tls {
            config.backend_tls.skip_verify = false;
        }
        if let Some(ca_cert) = self.ca_cert {
            config.backend_tls.ca_cert = Some(ca_cert);
        }
        if let Some(addr) = self.metrics_address {
            config.observability.metrics_address = Some(addr);
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Sandbox addresses may be given without a scheme.
fn normalize_gui_addr(addr: &str) -> String {
    if addr.starts_with("http") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(args: &[&str]) -> Result<ProxyConfig, ConfigError> {
        let mut argv = vec!["guiproxy"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn test_flags() {
        let config = parse(&[
            "--port",
            "4242",
            "--gui",
            "localhost:9000",
            "--controller",
            "1.2.3.4:17070",
            "--uuid",
            "example-uuid",
            "--juju1",
            "--nocolor",
        ])
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:4242");
        assert_eq!(config.sandbox_url, "http://localhost:9000");
        assert_eq!(config.controller_addr, "1.2.3.4:17070");
        assert_eq!(config.model_uuid(), Some("example-uuid"));
        assert!(config.legacy_mode);
        assert!(config.observability.no_color);
        assert_eq!(config.origin(), "http://0.0.0.0:4242");
    }

    #[test]
    fn test_controller_required() {
        let err = parse(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_env_preset() {
        let config = parse(&["--env", "production"]).unwrap();
        assert_eq!(config.controller_addr, "jimm.jujucharms.com:443");
        assert_eq!(config.gui_overrides.get("gisf"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_flags_win_over_env() {
        let config = parse(&[
            "--env",
            "brian",
            "--controller",
            "10.0.0.1:17070",
            "--config",
            "gisf: false, flags: {\"exterminate\": true}",
        ])
        .unwrap();
        assert_eq!(config.controller_addr, "10.0.0.1:17070");
        assert_eq!(config.gui_overrides.get("gisf"), Some(&Value::Bool(false)));
        assert!(config.gui_overrides.contains_key("charmstoreURL"));
        assert!(config.gui_overrides.contains_key("flags"));
    }

    #[test]
    fn test_unknown_env() {
        let err = parse(&["--env", "moon"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEnvironment { .. }));
    }

    #[test]
    fn test_verify_requires_ca_cert() {
        let result = Cli::try_parse_from(["guiproxy", "--verify-backend-tls"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_https_gui_kept() {
        assert_eq!(normalize_gui_addr("https://gui.example.com"), "https://gui.example.com");
        assert_eq!(normalize_gui_addr("1.2.3.4:6543"), "http://1.2.3.4:6543");
    }
}
