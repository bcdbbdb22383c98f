//! Predefined environments selectable with `--env`.

use serde_json::{Map, Value};

use crate::config::loader::ConfigError;
use crate::config::overrides::parse_overrides;

/// A named deployment the GUI can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    pub name: &'static str,
    pub controller_addr: &'static str,
    /// GUI configuration overrides, in `--config` syntax.
    pub overrides: &'static str,
}

impl Environment {
    /// Overrides as a JSON object.
    pub fn gui_overrides(&self) -> Result<Map<String, Value>, ConfigError> {
        parse_overrides(self.overrides)
    }
}

/// Known environments, sorted by name.
pub const ENVIRONMENTS: &[Environment] = &[
    Environment {
        name: "production",
        controller_addr: "jimm.jujucharms.com:443",
        overrides: r#"gisf: true, charmstoreURL: "https://api.jujucharms.com/charmstore/", plansURL: "https://api.jujucharms.com/omnibus/", termsURL: "https://api.jujucharms.com/terms/""#,
    },
    Environment {
        name: "qa",
        controller_addr: "jimm.jujugui.org:443",
        overrides: r#"gisf: true, charmstoreURL: "https://www.jujugui.org/charmstore/", plansURL: "https://www.jujugui.org/omnibus/", termsURL: "https://www.jujugui.org/terms/""#,
    },
    Environment {
        name: "staging",
        controller_addr: "jimm.staging.jujucharms.com:443",
        overrides: r#"gisf: true, charmstoreURL: "https://api.staging.jujucharms.com/charmstore/", plansURL: "https://api.staging.jujucharms.com/omnibus/", termsURL: "https://api.staging.jujucharms.com/terms/""#,
    },
];

/// Look up an environment by name. `brian` is an alias for `qa`.
pub fn find(name: &str) -> Result<&'static Environment, ConfigError> {
    let name = if name == "brian" { "qa" } else { name };
    ENVIRONMENTS
        .iter()
        .find(|env| env.name == name)
        .ok_or_else(|| ConfigError::UnknownEnvironment {
            name: name.to_string(),
            choices: choices(),
        })
}

/// Comma separated list of environment names.
pub fn choices() -> String {
    ENVIRONMENTS
        .iter()
        .map(|env| env.name)
        .collect::<Vec<_>>()
        .join(", ")
}
