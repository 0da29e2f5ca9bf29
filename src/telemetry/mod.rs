//! Startup-latency telemetry.
//!
//! # Data Flow
//! ```text
//! lifecycle start
//!     → window.rs (measure latency, push, maybe compact)
//!     → store.rs (ListStore: redis in production, memory in tests)
//! ```
//!
//! # Design Decisions
//! - The store owns the window; processes are clients and restarts share it
//! - The store is injected, never a process global
//! - Store failures are reported and startup continues; a malformed sample is fatal

pub mod store;
pub mod window;

pub use store::{ListStore, MemoryStore, RedisStore, StoreError};
pub use window::{LatencySample, RecordOutcome, StartupReference, TelemetryError, TelemetryWindow, DEFAULT_CAPACITY};
