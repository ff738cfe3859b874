//! Main runtime coordinator
//!
//! TigerStyle: Single entry point, explicit configuration, clean shutdown.

use crate::batch::{BatchCoordinator, BatchResult, CheckResult, RemoveResult};
use crate::directory::{ActorDirectory, DirectoryStats};
use crate::handle::ActorHandle;
use crate::mailbox::Operation;
use crate::sweeper::IdleSweepTask;
use parking_lot::Mutex;
use smartcache_core::config::{ActorConfig, BatchConfig, SmartCacheConfig};
use smartcache_core::error::{Error, Result};
use smartcache_core::io::{TimeProvider, WallClockTime};
use smartcache_core::EntityKey;
use smartcache_storage::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Configuration for the runtime
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Actor lifecycle settings
    pub actor: ActorConfig,
    /// Batch fan-out settings
    pub batch: BatchConfig,
}

impl RuntimeConfig {
    /// Validate both sections
    pub fn validate(&self) -> Result<()> {
        self.actor.validate()?;
        self.batch.validate()
    }
}

impl From<&SmartCacheConfig> for RuntimeConfig {
    fn from(config: &SmartCacheConfig) -> Self {
        Self {
            actor: config.actor.clone(),
            batch: config.batch.clone(),
        }
    }
}

/// Builder for creating a runtime
#[derive(Default)]
pub struct RuntimeBuilder {
    store: Option<Arc<dyn StateStore>>,
    time: Option<Arc<dyn TimeProvider>>,
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    /// Create a new runtime builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the durable store
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the time source (defaults to the wall clock)
    pub fn with_time(mut self, time: Arc<dyn TimeProvider>) -> Self {
        self.time = Some(time);
        self
    }

    /// Set the configuration
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<Runtime> {
        self.config.validate()?;

        let store = self
            .store
            .ok_or_else(|| Error::internal("state store is required"))?;
        let time = self
            .time
            .unwrap_or_else(|| Arc::new(WallClockTime::new()));

        Ok(Runtime::new(store, time, self.config))
    }
}

/// The SmartCache runtime
///
/// Owns the actor directory, the batch coordinator and the idle sweep.
/// Keys are served whether or not the sweep is running; `start()` only
/// enables background eviction.
pub struct Runtime {
    directory: Arc<ActorDirectory>,
    batch: BatchCoordinator,
    sweeper: Mutex<Option<IdleSweepTask>>,
    config: RuntimeConfig,
}

impl Runtime {
    /// Create a new runtime
    pub fn new(
        store: Arc<dyn StateStore>,
        time: Arc<dyn TimeProvider>,
        config: RuntimeConfig,
    ) -> Self {
        let directory = Arc::new(ActorDirectory::new(store, time, config.actor.clone()));
        let batch = BatchCoordinator::new(directory.clone(), config.batch.clone());

        Self {
            directory,
            batch,
            sweeper: Mutex::new(None),
            config,
        }
    }

    /// Start the idle sweep
    pub fn start(&self) -> Result<()> {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return Err(Error::internal("runtime already started"));
        }

        let quantum = Duration::from_millis(self.config.actor.collection_quantum_ms);
        info!(
            collection_quantum_ms = self.config.actor.collection_quantum_ms,
            collection_age_ms = self.config.actor.collection_age_ms,
            "Starting SmartCache runtime"
        );
        *sweeper = Some(IdleSweepTask::start(self.directory.clone(), quantum));
        Ok(())
    }

    /// Stop the sweep and release every actor
    pub async fn stop(&self) -> Result<()> {
        let task = self.sweeper.lock().take();
        if let Some(mut task) = task {
            info!("Stopping SmartCache runtime");
            task.stop().await;
        }
        self.directory.shutdown();
        Ok(())
    }

    /// Whether the idle sweep is running
    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .map(IdleSweepTask::is_running)
            .unwrap_or(false)
    }

    /// Runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The actor directory
    pub fn directory(&self) -> &Arc<ActorDirectory> {
        &self.directory
    }

    /// Get a handle to the actor for `key`, activating it if needed
    pub fn actor(&self, key: &EntityKey) -> Result<ActorHandle> {
        self.directory.get_or_activate(key)
    }

    /// Whether `key` is breached
    pub async fn is_breached(&self, key: &EntityKey) -> Result<bool> {
        self.directory.invoke(key, Operation::IsBreached).await
    }

    /// Mark `key` breached; `true` only on the transition
    pub async fn add(&self, key: &EntityKey) -> Result<bool> {
        self.directory.invoke(key, Operation::Add).await
    }

    /// Clear `key`
    pub async fn remove(&self, key: &EntityKey) -> Result<()> {
        self.directory.invoke(key, Operation::Remove).await.map(|_| ())
    }

    /// Mark every key breached
    pub async fn add_many(&self, keys: &[String]) -> Result<BatchResult> {
        self.batch.add_many(keys).await
    }

    /// Mark every key passing `validator` breached
    pub async fn add_many_with<F>(&self, keys: &[String], validator: F) -> Result<BatchResult>
    where
        F: Fn(&str) -> bool,
    {
        self.batch.add_many_with(keys, validator).await
    }

    /// Clear every key passing `validator`
    pub async fn remove_many<F>(&self, keys: &[String], validator: F) -> Result<RemoveResult>
    where
        F: Fn(&str) -> bool,
    {
        self.batch.remove_many(keys, validator).await
    }

    /// Look up every key passing `validator`
    pub async fn check_many<F>(&self, keys: &[String], validator: F) -> Result<CheckResult>
    where
        F: Fn(&str) -> bool,
    {
        self.batch.check_many(keys, validator).await
    }

    /// Run one idle sweep now
    pub fn sweep_idle(&self) -> usize {
        self.directory.sweep_idle()
    }

    /// Evict `key` now if it is idle
    pub fn deactivate(&self, key: &EntityKey) -> bool {
        self.directory.deactivate(key)
    }

    /// Directory counters
    pub fn stats(&self) -> DirectoryStats {
        self.directory.stats()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("directory", &self.directory)
            .field("running", &self.is_running())
            .finish()
    }
}
