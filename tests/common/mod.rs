//! Shared utilities for lifecycle integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use nrf::config::{NrfConfig, Scheme};
use nrf::lifecycle::{
    ChannelSignals, LifecycleController, SignalWatcher, StartError, StartOptions, TerminationSignal,
};
use nrf::telemetry::{ListStore, StartupReference};
use nrf::wiring::NrfWiring;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Plain-HTTP config on an ephemeral loopback port.
pub fn plain_config() -> NrfConfig {
    let mut config = NrfConfig::default();
    config.configuration.sbi.scheme = Scheme::Http;
    config.configuration.sbi.binding_ipv4 = "127.0.0.1".into();
    config.configuration.sbi.port = 0;
    config
}

/// A controller serving in the background, driven by injected signals.
pub struct RunningNrf {
    pub controller: Arc<LifecycleController>,
    pub wiring: Arc<NrfWiring>,
    pub signals: mpsc::UnboundedSender<TerminationSignal>,
    pub exit_codes: Arc<Mutex<Vec<i32>>>,
    pub addr: SocketAddr,
    pub serve: JoinHandle<Result<(), StartError>>,
}

pub async fn start_nrf(store: Option<Arc<dyn ListStore>>, grace: Duration) -> RunningNrf {
    let wiring = Arc::new(NrfWiring::new());
    let controller = Arc::new(LifecycleController::new(wiring.clone()));
    controller.configure(plain_config()).unwrap();

    let (signals, source) = ChannelSignals::new();
    let exit_codes = Arc::new(Mutex::new(Vec::new()));
    let sink = exit_codes.clone();
    let watcher = SignalWatcher::new(source, grace, move |code| sink.lock().unwrap().push(code));

    let options = StartOptions {
        reference: StartupReference::new(SystemTime::now()),
        store,
        watcher,
    };

    let running = controller.clone();
    let serve = tokio::spawn(async move { running.start(options).await });

    let mut addr = None;
    for _ in 0..200 {
        addr = controller.local_addr();
        if addr.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    RunningNrf {
        controller,
        wiring,
        signals,
        exit_codes,
        addr: addr.expect("NRF never bound its listener"),
        serve,
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
