//! End-to-end lifecycle tests: serve, signal, terminate.

use std::sync::Arc;
use std::time::Duration;

use nrf::lifecycle::{LifecycleState, TerminationSignal};
use nrf::telemetry::{ListStore, MemoryStore};

mod common;

#[tokio::test]
async fn test_serves_route_groups() {
    let nrf = common::start_nrf(None, Duration::from_millis(50)).await;
    let client = common::http_client();

    let res = client
        .get(format!("http://{}/nnrf-disc/v1/nf-instances", nrf.addr))
        .send()
        .await
        .expect("NRF unreachable");
    assert_eq!(res.status(), 501);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], 501);

    let res = client
        .post(format!("http://{}/oauth2/token", nrf.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 501);

    let res = client
        .get(format!("http://{}/unknown", nrf.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    nrf.controller.terminate();
    nrf.serve.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_signal_after_accepting_terminates_once() {
    let nrf = common::start_nrf(None, Duration::from_millis(100)).await;
    assert_eq!(nrf.controller.state(), LifecycleState::Running);
    let context = nrf.wiring.context().expect("context initialized at start");

    nrf.signals.send(TerminationSignal::Interrupt).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    nrf.signals.send(TerminationSignal::Terminate).unwrap();

    tokio::time::timeout(Duration::from_secs(5), nrf.serve)
        .await
        .expect("server did not stop after signal")
        .unwrap()
        .unwrap();

    assert_eq!(nrf.controller.state(), LifecycleState::Terminated);
    assert!(context.is_deregistered());

    // Give the watcher a moment to call its exit hook after terminate returns.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*nrf.exit_codes.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn test_direct_terminate_then_signal() {
    let nrf = common::start_nrf(None, Duration::from_millis(20)).await;

    assert!(nrf.controller.terminate());
    nrf.signals.send(TerminationSignal::Terminate).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!nrf.controller.terminate());
    assert_eq!(nrf.controller.state(), LifecycleState::Terminated);
    assert_eq!(*nrf.exit_codes.lock().unwrap(), vec![0]);
    nrf.serve.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_latency_window_spans_restarts() {
    let store = Arc::new(MemoryStore::new());

    for restart in 1..=11 {
        let shared: Arc<dyn ListStore> = store.clone();
        let nrf = common::start_nrf(Some(shared), Duration::ZERO).await;
        nrf.controller.terminate();
        nrf.serve.await.unwrap().unwrap();

        let window = store.list("nrflatency");
        match restart {
            1..=9 => assert_eq!(window.len(), restart),
            10 => assert_eq!(window.len(), 1),
            _ => assert_eq!(window.len(), 2),
        }
        assert!(window.iter().all(|v| v.parse::<i64>().is_ok()));
    }
}
