//! HTTPS passthrough to the controller API.
//!
//! Forwards one request/response cycle. Method, headers (minus `Host`),
//! query string and body go out unchanged; status, headers and body come
//! back unchanged. Nothing is retried: the controller operation may not be
//! idempotent.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Uri, Version};
use axum::response::Response;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::error::ProxyError;

/// HTTP client speaking TLS to the controller.
#[derive(Clone)]
pub struct HttpsPassthrough {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    authority: Authority,
}

impl HttpsPassthrough {
    pub fn new(controller_addr: &str, tls: Arc<rustls::ClientConfig>) -> Result<Self, ProxyError> {
        let authority = controller_addr.parse::<Authority>().map_err(|e| {
            ProxyError::InvalidTarget(format!("controller address {:?}: {}", controller_addr, e))
        })?;
        let connector = HttpsConnectorBuilder::new()
            .with_tls_config((*tls).clone())
            .https_only()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Ok(Self { client, authority })
    }

    /// Controller URI for a synthesized path, keeping the inbound query.
    pub fn backend_uri(&self, backend_path: &str, query: Option<&str>) -> Result<Uri, ProxyError> {
        let path_and_query = match query {
            Some(query) => format!("{}?{}", backend_path, query),
            None => backend_path.to_string(),
        };
        let path_and_query = path_and_query
            .parse::<PathAndQuery>()
            .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", path_and_query, e)))?;
        Uri::builder()
            .scheme(Scheme::HTTPS)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))
    }

    /// Forward the request and stream the controller response back.
    pub async fn forward(
        &self,
        request: Request<Body>,
        backend_path: &str,
    ) -> Result<Response, ProxyError> {
        let (mut parts, body) = request.into_parts();
        let uri = self.backend_uri(backend_path, parts.uri.query())?;

        tracing::debug!(method = %parts.method, uri = %uri, "Forwarding to controller");

        parts.uri = uri.clone();
        parts.headers.remove(HOST);
        // The controller connection is HTTP/1.1 whatever the client spoke.
        parts.version = Version::HTTP_11;

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| ProxyError::BackendUnreachable {
                target: uri.to_string(),
                reason: format!("{:?}", e),
            })?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
