//! Simulated time provider
//!
//! Lifecycle code reads the clock through `TimeProvider`; in simulation that
//! is backed by a shared [`SimClock`] that tests advance explicitly.

use crate::clock::SimClock;
use async_trait::async_trait;
use smartcache_core::TimeProvider;
use std::sync::Arc;

/// `TimeProvider` over a [`SimClock`]
///
/// `sleep_ms` advances the clock instead of waiting.
#[derive(Clone, Debug)]
pub struct SimTime {
    clock: Arc<SimClock>,
}

impl SimTime {
    pub fn new(clock: Arc<SimClock>) -> Self {
        Self { clock }
    }

    /// The underlying clock
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }
}

#[async_trait]
impl TimeProvider for SimTime {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    async fn sleep_ms(&self, ms: u64) {
        self.clock.advance_ms(ms);
        tokio::task::yield_now().await;
    }
}
