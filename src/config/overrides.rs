//! GUI configuration overrides given on the command line.
//!
//! The value is a comma separated list of `key: value` pairs, written as
//! the body of a YAML flow mapping:
//!
//! ```text
//! gisf: true
//! gisf: true, charmstoreURL: "https://1.2.3.4/cs"
//! flags: {"exterminate": true}
//! ```

use serde_json::{Map, Value};

use crate::config::loader::ConfigError;

/// Parse an overrides string into a JSON object.
pub fn parse_overrides(text: &str) -> Result<Map<String, Value>, ConfigError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(&format!("{{{}}}", text))
        .map_err(|e| ConfigError::Overrides(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::Overrides(format!(
            "expected key: value pairs, got {}",
            other
        ))),
    }
}

/// Merge `overlay` into `base`, overlay keys winning.
pub fn merge_overrides(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}
