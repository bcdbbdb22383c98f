//! Client TLS configuration for controller connections.
//!
//! Controllers are deployed with self-signed certificates, so by default the
//! certificate chain is not verified. Handshake signatures are still checked
//! against the presented certificate.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use thiserror::Error;

use crate::config::BackendTlsConfig;

/// Error type for TLS setup.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("cannot read CA certificate {path}: {source}")]
    CaFile {
        path: String,
        source: std::io::Error,
    },

    #[error("certificate verification enabled without a CA certificate")]
    MissingCaFile,

    #[error("no certificates found in {0}")]
    EmptyCaFile(String),

    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Build the client configuration shared by WebSocket and HTTPS connections.
pub fn backend_client_config(config: &BackendTlsConfig) -> Result<Arc<ClientConfig>, TlsError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    let client_config = if config.skip_verify {
        tracing::warn!("Controller certificate verification disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(SkipChainVerification { provider }))
            .with_no_client_auth()
    } else {
        let path = config.ca_cert.as_deref().ok_or(TlsError::MissingCaFile)?;
        builder
            .with_root_certificates(load_roots(path)?)
            .with_no_client_auth()
    };

    Ok(Arc::new(client_config))
}

fn load_roots(path: &Path) -> Result<RootCertStore, TlsError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| TlsError::CaFile {
        path: display.clone(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|source| TlsError::CaFile {
            path: display.clone(),
            source,
        })?;
        roots.add(cert)?;
    }
    if roots.is_empty() {
        return Err(TlsError::EmptyCaFile(display));
    }
    Ok(roots)
}

/// Accepts any certificate chain.
#[derive(Debug)]
struct SkipChainVerification {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for SkipChainVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
