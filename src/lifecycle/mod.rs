//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs, controller.rs):
//!     Load config → Init logging → Configure → Wire subsystems
//!     → Arm signal watcher → Record startup latency → Bind → Serve
//!
//! Shutdown (signals.rs, controller.rs, shutdown.rs):
//!     SIGTERM/SIGINT → Grace interval → Terminate once → Exit 0
//!
//! Supervision (supervisor.rs):
//!     Initialize → Spawn child with same flags → Drain stdout/stderr → Reap
//! ```
//!
//! # Design Decisions
//! - State only moves forward; Terminated is absorbing
//! - Signal watcher is armed before the listener serves
//! - Terminate is idempotent; exiting is left to the caller

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;
pub mod supervisor;

pub use controller::{LifecycleController, StartError, StartOptions};
pub use shutdown::Shutdown;
pub use signals::{ChannelSignals, OsSignals, SignalSource, SignalWatcher, Terminate, TerminationSignal};
pub use startup::{connect_store, InitError};
pub use state::{LifecycleError, LifecycleState};
pub use supervisor::{ExitReport, OutputStream, Supervisor, SupervisorError};
