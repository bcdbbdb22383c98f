//! Delegation of static assets to the GUI running in sandbox mode.

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Uri, Version};
use axum::response::Response;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::error::ProxyError;

/// Reverse proxy to the sandbox GUI origin.
#[derive(Clone)]
pub struct StaticDelegate {
    client: Client<HttpConnector, Body>,
    scheme: Scheme,
    authority: Authority,
    base_path: String,
}

impl StaticDelegate {
    pub fn new(sandbox_url: &str) -> Result<Self, ProxyError> {
        let invalid = |reason: String| {
            ProxyError::InvalidTarget(format!("sandbox URL {:?}: {}", sandbox_url, reason))
        };
        let url = Url::parse(sandbox_url).map_err(|e| invalid(e.to_string()))?;
        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            other => return Err(invalid(format!("unsupported scheme {}", other))),
        };
        let host = url.host_str().ok_or_else(|| invalid("missing host".into()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = authority
            .parse::<Authority>()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            scheme,
            authority,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }

    /// Sandbox URI for an inbound path and query.
    pub fn target_uri(&self, path: &str, query: Option<&str>) -> Result<Uri, ProxyError> {
        let path_and_query = match query {
            Some(query) => format!("{}{}?{}", self.base_path, path, query),
            None => format!("{}{}", self.base_path, path),
        };
        let path_and_query = path_and_query
            .parse::<PathAndQuery>()
            .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", path_and_query, e)))?;
        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))
    }

    /// Forward a request to the sandbox and stream its response back.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response, ProxyError> {
        let (mut parts, body) = request.into_parts();
        let uri = self.target_uri(parts.uri.path(), parts.uri.query())?;

        parts.uri = uri.clone();
        parts.headers.remove(HOST);
        parts.version = Version::HTTP_11;

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| ProxyError::SandboxUnreachable {
                target: uri.to_string(),
                reason: format!("{:?}", e),
            })?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
