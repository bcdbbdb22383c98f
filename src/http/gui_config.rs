//! Generated GUI configuration served at `/config.js`.
//!
//! The sandbox GUI reads `juju_config` on startup. The proxy points it at
//! itself: the API address is the real controller, but the socket templates
//! are the proxy's own `/api` and `/model/$uuid/api` paths.

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};

use crate::config::overrides::merge_overrides;
use crate::config::schema::ProxyConfig;

/// Renders and serves the configuration document.
#[derive(Debug, Clone)]
pub struct GuiConfig {
    body: String,
}

impl GuiConfig {
    pub fn new(
        controller_addr: &str,
        port: u16,
        uuid: Option<&str>,
        overrides: &Map<String, Value>,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert("baseUrl".into(), json!("/"));
        fields.insert("apiAddress".into(), json!(controller_addr));
        fields.insert("proxyPort".into(), json!(port));
        fields.insert("jujuEnvUUID".into(), json!(uuid.unwrap_or_default()));
        fields.insert("controllerSocketTemplate".into(), json!("/api"));
        fields.insert("socketTemplate".into(), json!("/model/$uuid/api"));
        fields.insert("socketProtocol".into(), json!("ws"));
        fields.insert("jujuCoreVersion".into(), json!(""));
        fields.insert("sandbox".into(), json!(false));
        fields.insert("gisf".into(), json!(false));
        fields.insert("interactiveLogin".into(), json!(true));
        fields.insert(
            "charmstoreURL".into(),
            json!("https://api.jujucharms.com/charmstore/"),
        );
        merge_overrides(&mut fields, overrides.clone());

        // `{:#}` pretty-prints a `Value`.
        Self {
            body: format!("var juju_config = {:#};\n", Value::Object(fields)),
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(
            &config.controller_addr,
            config.listener.port(),
            config.model_uuid(),
            &config.gui_overrides,
        )
    }

    /// The rendered document.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn response(&self) -> Response {
        (
            [
                (CONTENT_TYPE, "application/javascript"),
                (CACHE_CONTROL, "no-cache"),
            ],
            self.body.clone(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::overrides::parse_overrides;

    fn fields(config: &GuiConfig) -> Value {
        let json = config
            .body()
            .strip_prefix("var juju_config = ")
            .and_then(|rest| rest.strip_suffix(";\n"))
            .unwrap();
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = GuiConfig::new("1.2.3.4:17070", 4242, Some("example-uuid"), &Map::new());
        let fields = fields(&config);
        assert_eq!(fields["apiAddress"], "1.2.3.4:17070");
        assert_eq!(fields["proxyPort"], 4242);
        assert_eq!(fields["jujuEnvUUID"], "example-uuid");
        assert_eq!(fields["socketTemplate"], "/model/$uuid/api");
        assert_eq!(fields["gisf"], false);
    }

    #[test]
    fn test_document_is_pretty_printed() {
        let config = GuiConfig::new("1.2.3.4:17070", 8042, None, &Map::new());
        assert!(config.body().starts_with("var juju_config = {\n"));
        assert!(config.body().contains("\n  \"apiAddress\": \"1.2.3.4:17070\""));
        assert!(config.body().ends_with("\n};\n"));
    }

    #[test]
    fn test_missing_uuid() {
        let config = GuiConfig::new("1.2.3.4:17070", 8042, None, &Map::new());
        assert_eq!(fields(&config)["jujuEnvUUID"], "");
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let overrides =
            parse_overrides(r#"gisf: true, flags: {"exterminate": true}"#).unwrap();
        let config = GuiConfig::new("1.2.3.4:17070", 8042, None, &overrides);
        let fields = fields(&config);
        assert_eq!(fields["gisf"], true);
        assert_eq!(fields["flags"]["exterminate"], true);
        assert_eq!(fields["interactiveLogin"], true);
    }

    #[test]
    fn test_response_headers() {
        let config = GuiConfig::new("1.2.3.4:17070", 8042, None, &Map::new());
        let response = config.response();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/javascript"
        );
    }
}
