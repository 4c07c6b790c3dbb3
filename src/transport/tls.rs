//! TLS acceptor setup shared by the DoT and DoH transports.

use crate::error::{DnsError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

/// Build a TLS acceptor from PEM certificate chain and private key files.
pub fn acceptor_from_pem(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor> {
    let certs = rustls_pemfile::certs(&mut BufReader::new(
        File::open(cert_path).map_err(|e| DnsError::Config(e.to_string()))?,
    ))
    .collect::<std::io::Result<Vec<_>>>()
    .map_err(|e| DnsError::Config(format!("bad certificate file: {}", e)))?;
    if certs.is_empty() {
        return Err(DnsError::Config(format!(
            "no certificates in {}",
            cert_path.display()
        )));
    }

    let key = rustls_pemfile::private_key(&mut BufReader::new(
        File::open(key_path).map_err(|e| DnsError::Config(e.to_string()))?,
    ))
    .map_err(|e| DnsError::Config(format!("bad key file: {}", e)))?
    .ok_or_else(|| DnsError::Config(format!("no private key in {}", key_path.display())))?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| DnsError::Config(format!("TLS configuration rejected: {}", e)))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
