//! SBI HTTP server.
//!
//! # Responsibilities
//! - Build the Axum router from the wired route groups
//! - Serve plain HTTP or HTTPS on an already-bound listener
//! - Stop accepting and drain in-flight requests on shutdown

use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::net::Listener;
use crate::wiring::SubsystemWiring;

/// Upper bound on draining in-flight TLS connections after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP server for the service-based interface.
pub struct SbiServer {
    router: Router,
}

impl SbiServer {
    /// Create the server with every route group `wiring` registers.
    pub fn new(wiring: &dyn SubsystemWiring) -> Self {
        let router = wiring
            .register_routes(Router::new())
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plain HTTP until `shutdown` fires or the listener fails.
    pub async fn serve(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr();
        tracing::info!(address = %addr, scheme = "http", "SBI server accepting connections");

        axum::serve(listener.into_tokio(), self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(address = %addr, "SBI server stopped");
        Ok(())
    }

    /// Serve HTTPS until `shutdown` fires or the listener fails.
    pub async fn serve_tls(
        self,
        listener: Listener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr();
        let handle = axum_server::Handle::new();

        let stopper = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            stopper.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        tracing::info!(address = %addr, scheme = "https", "SBI server accepting connections");

        axum_server::from_tcp_rustls(listener.into_std()?, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!(address = %addr, "SBI server stopped");
        Ok(())
    }
}
