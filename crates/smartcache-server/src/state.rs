//! Shared handler state

use crate::service::BreachService;
use std::time::Instant;

/// State cloned into every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    service: BreachService,
    started_at: Instant,
}

impl AppState {
    pub fn new(service: BreachService) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }

    pub fn service(&self) -> &BreachService {
        &self.service
    }

    /// Seconds since the state was created
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
