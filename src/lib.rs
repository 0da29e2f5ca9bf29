//! NRF service host library.
//!
//! Takes the NRF process from cold start to serving, keeps a store-backed
//! window of startup latencies, and tears down once on SIGINT/SIGTERM.

pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod telemetry;
pub mod wiring;

pub use config::schema::NrfConfig;
pub use lifecycle::{LifecycleController, LifecycleState, Supervisor};
pub use wiring::NrfWiring;
