//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint (scheme + address, fixed at start)
//!     → listener.rs (bind once, fatal on failure)
//!     → tls.rs (https only: load certificate chain and key)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - No bind retries; a bind failure ends the process
//! - TLS material is validated before the socket starts serving

pub mod listener;
pub mod tls;

pub use listener::{BindError, Listener};
pub use tls::{load_tls_config, TlsError};
