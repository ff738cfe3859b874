//! Simulation harness for deterministic testing
//!
//! TigerStyle: Reproducible test execution with explicit configuration.
//!
//! A simulation owns a seeded RNG, a manually advanced clock, a fault
//! injector and a simulated store, and runs the test body on a fresh
//! single-threaded tokio runtime. Replaying a failure only needs the seed,
//! which is logged at the start of every run.

use crate::clock::SimClock;
use crate::fault::{FaultConfig, FaultInjector, FaultInjectorBuilder};
use crate::rng::DeterministicRng;
use crate::store::SimStore;
use crate::time::SimTime;
use smartcache_core::{ActorConfig, BatchConfig, Error, Result, TimeProvider};
use smartcache_runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Configuration for a simulation
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Runtime configuration for runtimes built from the environment
    pub runtime: RuntimeConfig,
}

impl SimConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            runtime: RuntimeConfig::default(),
        }
    }

    /// Seed from `DST_SEED`, or a random seed
    pub fn from_env_or_random() -> Self {
        let seed = std::env::var("DST_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);

        tracing::info!(seed, "DST seed (set DST_SEED={} to replay)", seed);

        Self::new(seed)
    }

    pub fn with_actor_config(mut self, actor: ActorConfig) -> Self {
        self.runtime.actor = actor;
        self
    }

    pub fn with_batch_config(mut self, batch: BatchConfig) -> Self {
        self.runtime.batch = batch;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Everything a simulated test can reach
pub struct SimEnvironment {
    pub clock: Arc<SimClock>,
    pub time: Arc<SimTime>,
    pub rng: Arc<DeterministicRng>,
    pub store: SimStore,
    pub faults: Arc<FaultInjector>,
    runtime_config: RuntimeConfig,
}

impl SimEnvironment {
    /// Advance simulation time
    pub fn advance_time_ms(&self, ms: u64) {
        self.clock.advance_ms(ms);
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Independent RNG stream
    pub fn fork_rng(&self) -> DeterministicRng {
        self.rng.fork()
    }

    /// Build a runtime over the simulated store and clock
    ///
    /// Every call returns a fresh runtime sharing the same durable records,
    /// which is how tests model a process restart.
    pub fn runtime(&self) -> Result<Runtime> {
        RuntimeBuilder::new()
            .with_store(Arc::new(self.store.clone()))
            .with_time(self.time.clone() as Arc<dyn TimeProvider>)
            .with_config(self.runtime_config.clone())
            .build()
    }
}

/// Main simulation harness
pub struct Simulation {
    config: SimConfig,
    fault_configs: Vec<FaultConfig>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            fault_configs: Vec::new(),
        }
    }

    /// Add a fault rule
    pub fn with_fault(mut self, fault: FaultConfig) -> Self {
        self.fault_configs.push(fault);
        self
    }

    pub fn with_faults(mut self, faults: Vec<FaultConfig>) -> Self {
        self.fault_configs.extend(faults);
        self
    }

    fn environment(self) -> SimEnvironment {
        let rng = Arc::new(DeterministicRng::new(self.config.seed));
        let clock = Arc::new(SimClock::default());

        let mut builder = FaultInjectorBuilder::new(rng.fork());
        for fault in self.fault_configs {
            builder = builder.with_fault(fault);
        }
        let faults = Arc::new(builder.build());

        let time = Arc::new(SimTime::new(clock.clone()));
        let store = SimStore::new(faults.clone(), clock.clone());

        SimEnvironment {
            clock,
            time,
            rng,
            store,
            faults,
            runtime_config: self.config.runtime,
        }
    }

    /// Run `test` on a fresh single-threaded runtime
    pub fn run<F, Fut, T>(self, test: F) -> std::result::Result<T, SimulationError>
    where
        F: FnOnce(SimEnvironment) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let seed = self.config.seed;
        let env = self.environment();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SimulationError::RuntimeError(e.to_string()))?;

        runtime
            .block_on(test(env))
            .map_err(|error| SimulationError::TestFailed { seed, error })
    }

    /// Run `test` inside an existing async context
    pub async fn run_async<F, Fut, T>(self, test: F) -> std::result::Result<T, SimulationError>
    where
        F: FnOnce(SimEnvironment) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let seed = self.config.seed;
        let env = self.environment();
        test(env)
            .await
            .map_err(|error| SimulationError::TestFailed { seed, error })
    }
}

/// Simulation failure
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("test failed (seed {seed}): {error}")]
    TestFailed { seed: u64, error: Error },

    #[error("runtime error: {0}")]
    RuntimeError(String),
}
