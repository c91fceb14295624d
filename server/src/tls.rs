//! Loading of the server certificate and private key into a rustls config.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("certificate file not found: {0}")]
    CertNotFound(PathBuf),

    #[error("private key file not found: {0}")]
    KeyNotFound(PathBuf),

    #[error("no private key found in {0}")]
    NoPrivateKey(PathBuf),

    #[error("failed to read TLS material: {0}")]
    Io(#[from] std::io::Error),

    #[error("certificate or key rejected: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Build the rustls server config the listener presents to clients.
pub fn load_server_config(cert_file: &Path, key_file: &Path) -> Result<ServerConfig, TlsError> {
    if !cert_file.exists() {
        return Err(TlsError::CertNotFound(cert_file.to_path_buf()));
    }
    if !key_file.exists() {
        return Err(TlsError::KeyNotFound(key_file.to_path_buf()));
    }

    let mut cert_reader = BufReader::new(File::open(cert_file)?);
    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut cert_reader).collect::<Result<_, _>>()?;

    let mut key_reader = BufReader::new(File::open(key_file)?);
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut key_reader)?
        .ok_or_else(|| TlsError::NoPrivateKey(key_file.to_path_buf()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_certificate_is_reported() {
        let result = load_server_config(
            Path::new("/nonexistent/server.pem"),
            Path::new("/nonexistent/server.key"),
        );
        assert!(matches!(result, Err(TlsError::CertNotFound(_))));
    }

    #[test]
    fn missing_key_is_reported() {
        // Any readable file works as the certificate path for this check.
        let cert = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let result = load_server_config(&cert, Path::new("/nonexistent/server.key"));
        assert!(matches!(result, Err(TlsError::KeyNotFound(_))));
    }
}
