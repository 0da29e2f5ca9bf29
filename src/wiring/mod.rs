//! Subsystem wiring: route groups and shared context.
//!
//! The lifecycle controller sees this as one bring-up step plus one
//! deregistration step, both invoked exactly once.

pub mod context;
pub mod routes;

use std::sync::{Arc, OnceLock};

use axum::Router;

use crate::config::{Endpoint, NrfConfig};
pub use context::NrfContext;

/// Bring-up and tear-down hooks for the services hosted by the process.
pub trait SubsystemWiring: Send + Sync {
    /// Add the service route groups to `router`.
    fn register_routes(&self, router: Router) -> Router;

    /// Build the shared context.
    fn init_context(&self, config: &NrfConfig, endpoint: Endpoint);

    /// Withdraw this instance from its peers.
    fn deregister(&self);
}

/// Wiring for the NRF's three service groups.
#[derive(Default)]
pub struct NrfWiring {
    context: OnceLock<Arc<NrfContext>>,
}

impl NrfWiring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> Option<Arc<NrfContext>> {
        self.context.get().cloned()
    }
}

impl SubsystemWiring for NrfWiring {
    fn register_routes(&self, router: Router) -> Router {
        router
            .merge(routes::access_token())
            .merge(routes::discovery())
            .merge(routes::management())
    }

    fn init_context(&self, config: &NrfConfig, endpoint: Endpoint) {
        let context = self.context.get_or_init(|| Arc::new(NrfContext::new(config, endpoint)));
        tracing::info!(
            nrf_instance_id = %context.nrf_instance_id,
            uri = %context.uri,
            "NRF context initialized"
        );
    }

    fn deregister(&self) {
        match self.context.get() {
            Some(context) if context.deregister() => {
                tracing::info!(nrf_instance_id = %context.nrf_instance_id, "NRF instance deregistered");
            }
            Some(_) => tracing::debug!("NRF instance already deregistered"),
            None => tracing::debug!("No NRF context to deregister"),
        }
    }
}
