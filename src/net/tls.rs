//! TLS configuration and certificate loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Loading the SBI certificate or key failed. Fatal at startup.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificate found in {0:?}")]
    NoCertificates(PathBuf),

    #[error("no private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS material: {0}")]
    Rustls(std::io::Error),
}

async fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load TLS configuration from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let cert_pem = read(cert_path).await?;
    let key_pem = read(key_path).await?;

    let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Io {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key = rustls_pemfile::private_key(&mut key_pem.as_slice()).map_err(|source| TlsError::Io {
        path: key_path.to_path_buf(),
        source,
    })?;
    if key.is_none() {
        return Err(TlsError::NoPrivateKey(key_path.to_path_buf()));
    }

    tracing::debug!(cert = ?cert_path, chain_len = certs.len(), "TLS material loaded");

    RustlsConfig::from_pem(cert_pem, key_pem)
        .await
        .map_err(TlsError::Rustls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FAKE_CERT: &str = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";

    fn pem_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_missing_certificate_file() {
        let key = pem_file("");
        let err = load_tls_config(Path::new("/nonexistent/nrf.pem"), key.path())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TlsError::Io { .. }));
    }

    #[tokio::test]
    async fn test_certificate_file_without_certificates() {
        let cert = pem_file("not a pem file\n");
        let key = pem_file("");
        let err = load_tls_config(cert.path(), key.path()).await.err().unwrap();
        assert!(matches!(err, TlsError::NoCertificates(_)));
    }

    #[tokio::test]
    async fn test_key_file_without_key() {
        let cert = pem_file(FAKE_CERT);
        let key = pem_file(FAKE_CERT);
        let err = load_tls_config(cert.path(), key.path()).await.err().unwrap();
        assert!(matches!(err, TlsError::NoPrivateKey(_)));
    }
}
