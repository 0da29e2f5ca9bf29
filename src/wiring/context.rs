//! Process-wide NRF context, built once at start.

use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use crate::config::{Endpoint, NrfConfig};
use crate::observability::logging::MONGODB_TARGET;

#[derive(Debug)]
pub struct NrfContext {
    pub nrf_instance_id: Uuid,
    /// Base URI peers use to reach this NRF.
    pub uri: String,
    pub mongodb_name: String,
    pub mongodb_url: String,
    deregistered: AtomicBool,
}

impl NrfContext {
    pub fn new(config: &NrfConfig, endpoint: Endpoint) -> Self {
        let mongodb = &config.configuration.mongodb;
        tracing::info!(
            target: MONGODB_TARGET,
            name = %mongodb.name,
            url = %mongodb.url,
            "Database settings registered"
        );

        Self {
            nrf_instance_id: Uuid::new_v4(),
            uri: endpoint.to_string(),
            mongodb_name: mongodb.name.clone(),
            mongodb_url: mongodb.url.clone(),
            deregistered: AtomicBool::new(false),
        }
    }

    /// Mark the instance deregistered. Returns false if it already was.
    pub fn deregister(&self) -> bool {
        !self.deregistered.swap(true, Ordering::AcqRel)
    }

    pub fn is_deregistered(&self) -> bool {
        self.deregistered.load(Ordering::Acquire)
    }
}
