//! SBI listener binding.
//!
//! # Responsibilities
//! - Bind the configured endpoint exactly once
//! - Report bind failures with the address that failed
//! - Hand the socket to the plain or TLS serve path

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

/// Binding the SBI address failed. Fatal; the controller does not retry.
#[derive(Debug, Error)]
#[error("failed to bind {addr}: {source}")]
pub struct BindError {
    pub addr: SocketAddr,
    #[source]
    pub source: std::io::Error,
}

/// A bound, not yet serving, TCP listener.
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    pub async fn bind(addr: SocketAddr) -> Result<Self, BindError> {
        let inner = TcpListener::bind(addr)
            .await
            .map_err(|source| BindError { addr, source })?;
        let local_addr = inner
            .local_addr()
            .map_err(|source| BindError { addr, source })?;

        tracing::info!(address = %local_addr, "Listener bound");
        Ok(Self { inner, local_addr })
    }

    /// Address actually bound (differs from the request when port 0 was asked for).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn into_tokio(self) -> TcpListener {
        self.inner
    }

    /// Non-blocking std listener, as the TLS acceptor expects.
    pub fn into_std(self) -> std::io::Result<std::net::TcpListener> {
        self.inner.into_std()
    }
}
