//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! bound listener (plain or TLS)
//!     → server.rs (Axum setup, trace layer, graceful shutdown)
//!     → route groups registered by the subsystem wiring
//! ```

pub mod server;

pub use server::SbiServer;
