//! Lifecycle controller: configure, start, serve, terminate.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use thiserror::Error;

use crate::config::{Endpoint, NrfConfig, Scheme};
use crate::http::SbiServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{SignalWatcher, Terminate};
use crate::lifecycle::state::{LifecycleError, LifecycleState, StateCell};
use crate::net::{load_tls_config, BindError, Listener, TlsError};
use crate::telemetry::{ListStore, RecordOutcome, StartupReference, TelemetryError, TelemetryWindow};
use crate::wiring::SubsystemWiring;

/// Everything `start` needs besides the configuration.
pub struct StartOptions {
    /// Origin of the startup-latency measurement.
    pub reference: StartupReference,
    /// Telemetry store; `None` when it is disabled or unreachable.
    pub store: Option<Arc<dyn ListStore>>,
    /// Armed before the listener starts serving.
    pub watcher: SignalWatcher,
}

/// Reasons `start` gives up. All of them are fatal for the process.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("invalid SBI binding address: {0}")]
    Endpoint(#[from] std::net::AddrParseError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("HTTP server setup failed: {0}")]
    Bind(#[from] BindError),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error("HTTP server failed: {0}")]
    Serve(#[from] std::io::Error),
}

/// Owns the process lifecycle state and drives every transition.
pub struct LifecycleController {
    state: StateCell,
    config: OnceLock<NrfConfig>,
    endpoint: OnceLock<Endpoint>,
    local_addr: OnceLock<SocketAddr>,
    wiring: Arc<dyn SubsystemWiring>,
    shutdown: Shutdown,
}

impl LifecycleController {
    pub fn new(wiring: Arc<dyn SubsystemWiring>) -> Self {
        Self {
            state: StateCell::new(),
            config: OnceLock::new(),
            endpoint: OnceLock::new(),
            local_addr: OnceLock::new(),
            wiring,
            shutdown: Shutdown::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    pub fn config(&self) -> Option<&NrfConfig> {
        self.config.get()
    }

    /// Scheme and address, available once `start` has begun.
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.endpoint.get().copied()
    }

    /// Address the listener actually bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Accept the validated configuration. Uninitialized → Configured.
    pub fn configure(&self, config: NrfConfig) -> Result<(), LifecycleError> {
        self.state
            .advance(LifecycleState::Uninitialized, LifecycleState::Configured)?;
        let _ = self.config.set(config);
        Ok(())
    }

    /// Bring the subsystems up and serve until terminated.
    ///
    /// Returns `Ok(())` after a graceful termination. Any error is fatal; the
    /// caller reports it and exits non-zero.
    pub async fn start(self: &Arc<Self>, options: StartOptions) -> Result<(), StartError> {
        // Subscribed before Running so a terminate racing startup still stops the server.
        let shutdown_rx = self.shutdown.subscribe();
        self.state
            .advance(LifecycleState::Configured, LifecycleState::Running)?;
        let config = self.config.get().ok_or(LifecycleError::UnexpectedState {
            expected: LifecycleState::Configured,
            actual: LifecycleState::Uninitialized,
        })?;

        let endpoint = config.configuration.sbi.endpoint()?;
        let endpoint = *self.endpoint.get_or_init(|| endpoint);
        tracing::info!(endpoint = %endpoint, "Server started");

        let server = SbiServer::new(self.wiring.as_ref());
        self.wiring.init_context(config, endpoint);

        let target: Arc<dyn Terminate> = self.clone();
        let _watcher = options.watcher.spawn(target);

        if let Some(store) = options.store {
            self.record_startup_latency(store, &options.reference).await?;
        }

        let tls = match endpoint.scheme {
            Scheme::Http => None,
            Scheme::Https => {
                let tls = &config.configuration.sbi.tls;
                Some(load_tls_config(&tls.pem, &tls.key).await?)
            }
        };

        let listener = Listener::bind(endpoint.addr).await?;
        let _ = self.local_addr.set(listener.local_addr());
        tracing::info!(address = %listener.local_addr(), "Binding addr");

        match tls {
            None => server.serve(listener, shutdown_rx).await?,
            Some(tls) => server.serve_tls(listener, tls, shutdown_rx).await?,
        }
        Ok(())
    }

    async fn record_startup_latency(
        &self,
        store: Arc<dyn ListStore>,
        reference: &StartupReference,
    ) -> Result<(), TelemetryError> {
        let Some(config) = self.config.get() else {
            return Ok(());
        };
        let telemetry = &config.configuration.telemetry;
        let window = TelemetryWindow::new(store, telemetry.latency_key.clone(), telemetry.capacity);

        match window.record_startup(reference, SystemTime::now()).await {
            Ok(RecordOutcome::Recorded { sample, len }) => {
                tracing::debug!(latency_us = sample.as_micros(), window_len = len, "Latency window updated");
                Ok(())
            }
            Ok(RecordOutcome::Compacted { drained, mean, .. }) => {
                tracing::debug!(drained, mean_us = mean.as_micros(), "Latency window average stored");
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Startup latency not recorded, continuing without telemetry");
                Ok(())
            }
        }
    }

    /// Tear down once. Running → Terminating → Terminated.
    ///
    /// Later calls, concurrent or not, do nothing and return false. Does not
    /// exit the process.
    pub fn terminate(&self) -> bool {
        if let Err(e) = self
            .state
            .advance(LifecycleState::Running, LifecycleState::Terminating)
        {
            tracing::debug!(error = %e, "Terminate ignored");
            return false;
        }

        tracing::info!("Terminating NRF...");
        self.wiring.deregister();
        self.shutdown.trigger();

        if let Err(e) = self
            .state
            .advance(LifecycleState::Terminating, LifecycleState::Terminated)
        {
            tracing::error!(error = %e, "Lifecycle moved during termination");
        }
        tracing::info!("NRF terminated");
        true
    }
}

impl Terminate for LifecycleController {
    fn terminate(&self) -> bool {
        LifecycleController::terminate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::signals::ChannelSignals;
    use crate::telemetry::MemoryStore;
    use crate::wiring::NrfWiring;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingWiring {
        inits: AtomicUsize,
        deregistrations: AtomicUsize,
    }

    impl SubsystemWiring for CountingWiring {
        fn register_routes(&self, router: axum::Router) -> axum::Router {
            router
        }

        fn init_context(&self, _config: &NrfConfig, _endpoint: Endpoint) {
            self.inits.fetch_add(1, Ordering::SeqCst);
        }

        fn deregister(&self) {
            self.deregistrations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn plain_config() -> NrfConfig {
        let mut config = NrfConfig::default();
        config.configuration.sbi.scheme = Scheme::Http;
        config.configuration.sbi.binding_ipv4 = "127.0.0.1".into();
        config.configuration.sbi.port = 0;
        config
    }

    fn idle_watcher() -> SignalWatcher {
        let (_tx, source) = ChannelSignals::new();
        SignalWatcher::new(source, Duration::ZERO, |_| {})
    }

    fn options(store: Option<Arc<dyn ListStore>>) -> StartOptions {
        StartOptions {
            reference: StartupReference::new(SystemTime::now()),
            store,
            watcher: idle_watcher(),
        }
    }

    async fn wait_for_addr(controller: &LifecycleController) -> SocketAddr {
        for _ in 0..200 {
            if let Some(addr) = controller.local_addr() {
                return addr;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("server never bound");
    }

    #[test]
    fn test_terminate_before_start_is_noop() {
        let wiring = Arc::new(CountingWiring::default());
        let controller = LifecycleController::new(wiring.clone());
        controller.configure(plain_config()).unwrap();

        assert!(!controller.terminate());
        assert_eq!(controller.state(), LifecycleState::Configured);
        assert_eq!(wiring.deregistrations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_configure_only_once() {
        let controller = LifecycleController::new(Arc::new(NrfWiring::new()));
        controller.configure(plain_config()).unwrap();
        assert!(controller.configure(plain_config()).is_err());
    }

    #[tokio::test]
    async fn test_start_requires_configure() {
        let controller = Arc::new(LifecycleController::new(Arc::new(NrfWiring::new())));
        let err = controller.start(options(None)).await.unwrap_err();
        assert!(matches!(err, StartError::Lifecycle(_)));
    }

    #[tokio::test]
    async fn test_terminate_twice_deregisters_once() {
        let wiring = Arc::new(CountingWiring::default());
        let controller = Arc::new(LifecycleController::new(wiring.clone()));
        controller.configure(plain_config()).unwrap();

        assert!(controller.endpoint().is_none());

        let running = controller.clone();
        let serve = tokio::spawn(async move { running.start(options(None)).await });
        let bound = wait_for_addr(&controller).await;
        assert_eq!(controller.state(), LifecycleState::Running);
        let endpoint = controller.endpoint().unwrap();
        assert_eq!(endpoint.scheme, Scheme::Http);
        assert_eq!(endpoint.addr.ip(), bound.ip());

        assert!(controller.terminate());
        assert!(!controller.terminate());

        serve.await.unwrap().unwrap();
        assert_eq!(controller.state(), LifecycleState::Terminated);
        assert_eq!(wiring.inits.load(Ordering::SeqCst), 1);
        assert_eq!(wiring.deregistrations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_records_latency_sample() {
        let store = Arc::new(MemoryStore::new());
        let controller = Arc::new(LifecycleController::new(Arc::new(NrfWiring::new())));
        controller.configure(plain_config()).unwrap();

        let running = controller.clone();
        let shared: Arc<dyn ListStore> = store.clone();
        let serve = tokio::spawn(async move { running.start(options(Some(shared))).await });
        wait_for_addr(&controller).await;

        assert_eq!(store.list("nrflatency").len(), 1);
        controller.terminate();
        serve.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_store_does_not_block_startup() {
        let controller = Arc::new(LifecycleController::new(Arc::new(NrfWiring::new())));
        controller.configure(plain_config()).unwrap();

        let running = controller.clone();
        let store: Arc<dyn ListStore> = Arc::new(MemoryStore::unavailable());
        let serve = tokio::spawn(async move { running.start(options(Some(store))).await });
        wait_for_addr(&controller).await;

        controller.terminate();
        serve.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_malformed_window_aborts_startup() {
        let store = Arc::new(MemoryStore::new());
        for _ in 0..9 {
            store.push("nrflatency", "garbage").await.unwrap();
        }
        let controller = Arc::new(LifecycleController::new(Arc::new(NrfWiring::new())));
        controller.configure(plain_config()).unwrap();

        let err = controller
            .start(options(Some(store as Arc<dyn ListStore>)))
            .await
            .unwrap_err();
        assert!(matches!(err, StartError::Telemetry(ref e) if e.is_fatal()));
        assert!(controller.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_bind_failure_is_fatal() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = plain_config();
        config.configuration.sbi.port = occupied.local_addr().unwrap().port();

        let controller = Arc::new(LifecycleController::new(Arc::new(NrfWiring::new())));
        controller.configure(config).unwrap();

        let err = controller.start(options(None)).await.unwrap_err();
        assert!(matches!(err, StartError::Bind(_)));
    }

    #[tokio::test]
    async fn test_missing_tls_material_is_fatal() {
        let mut config = plain_config();
        config.configuration.sbi.scheme = Scheme::Https;
        config.configuration.sbi.tls.pem = "/nonexistent/nrf.pem".into();

        let controller = Arc::new(LifecycleController::new(Arc::new(NrfWiring::new())));
        controller.configure(config).unwrap();

        let err = controller.start(options(None)).await.unwrap_err();
        assert!(matches!(err, StartError::Tls(_)));
        assert!(controller.local_addr().is_none());
    }
}
