//! Key actor activation and lifecycle
//!
//! TigerStyle: Explicit lifecycle states, one actor per key.
//!
//! A [`KeyActor`] owns the in-memory `breached` flag for exactly one key. It
//! runs as a single tokio task draining the key's mailbox, so every operation
//! on a key is serialized without a lock.
//!
//! ## Lifecycle
//!
//! ```text
//!   Inactive --> Activating --> Active --> Deactivating --> Inactive
//!      ^                          |
//!      +--(failed mutation, via Deactivating)
//! ```
//!
//! - Hydration reads the durable record once per activation. A failed or
//!   timed-out read is logged and the actor continues with `false`.
//! - A failed or timed-out write/clear leaves the flag untouched, fails the
//!   operation and drops the actor back to `Inactive`; the next message
//!   hydrates again from the store.
//! - Deactivation never writes to the store.

use crate::mailbox::{MailboxReceiver, Operation};
use smartcache_core::error::{Error, Result};
use smartcache_core::io::TimeProvider;
use smartcache_core::metrics;
use smartcache_core::{EntityKey, EntityState};
use smartcache_storage::StateStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Actor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    /// No in-memory state (initial state, after deactivation or invalidation)
    #[default]
    Inactive,
    /// Hydrating from the durable store
    Activating,
    /// Hydrated and serving operations
    Active,
    /// Releasing in-memory state
    Deactivating,
}

impl ActivationState {
    /// Operations execute only while Active
    pub fn can_invoke(&self) -> bool {
        matches!(self, ActivationState::Active)
    }

    /// Check if `next` is a legal successor
    pub fn can_transition_to(&self, next: ActivationState) -> bool {
        match (self, next) {
            (ActivationState::Inactive, ActivationState::Activating) => true,
            (ActivationState::Activating, ActivationState::Active) => true,
            (ActivationState::Activating, ActivationState::Inactive) => true,
            (ActivationState::Active, ActivationState::Deactivating) => true,
            (ActivationState::Deactivating, ActivationState::Inactive) => true,
            _ if *self == next => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ActivationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationState::Inactive => write!(f, "inactive"),
            ActivationState::Activating => write!(f, "activating"),
            ActivationState::Active => write!(f, "active"),
            ActivationState::Deactivating => write!(f, "deactivating"),
        }
    }
}

/// Per-activation statistics
///
/// Uses monotonic timestamps (u64 ms) for DST compatibility.
#[derive(Debug, Clone, Default)]
pub struct ActivationStats {
    /// When the actor was activated (monotonic ms)
    pub activated_at_ms: Option<u64>,
    /// Last time the actor processed a message (monotonic ms)
    pub last_activity_at_ms: Option<u64>,
    /// Operations processed in this activation
    pub operation_count: u64,
    /// Operations that returned an error
    pub error_count: u64,
    /// Total time spent processing in ms
    pub total_processing_time_ms: u64,
}

impl ActivationStats {
    /// Create new stats stamped with the activation time
    pub fn with_time(time: &dyn TimeProvider) -> Self {
        Self {
            activated_at_ms: Some(time.monotonic_ms()),
            ..Default::default()
        }
    }

    /// Record one processed operation
    pub fn record_operation_with_time(
        &mut self,
        duration_ms: u64,
        is_error: bool,
        time: &dyn TimeProvider,
    ) {
        self.last_activity_at_ms = Some(time.monotonic_ms());
        self.operation_count = self.operation_count.wrapping_add(1);
        self.total_processing_time_ms = self.total_processing_time_ms.saturating_add(duration_ms);
        if is_error {
            self.error_count = self.error_count.wrapping_add(1);
        }
    }

    /// Time since last activity (or activation when nothing ran yet)
    pub fn idle_time_ms(&self, time: &dyn TimeProvider) -> u64 {
        let now_ms = time.monotonic_ms();
        match self.last_activity_at_ms.or(self.activated_at_ms) {
            Some(t) => now_ms.saturating_sub(t),
            None => 0,
        }
    }
}

/// Single-writer owner of one key's in-memory state
pub struct KeyActor {
    key: EntityKey,
    state: ActivationState,
    breached: bool,
    store: Arc<dyn StateStore>,
    storage_timeout: Duration,
    time: Arc<dyn TimeProvider>,
    stats: ActivationStats,
}

impl KeyActor {
    /// Create an inactive actor; hydration happens on the first operation
    pub fn new(
        key: EntityKey,
        store: Arc<dyn StateStore>,
        storage_timeout: Duration,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        debug_assert!(!storage_timeout.is_zero(), "storage timeout must be positive");
        Self {
            key,
            state: ActivationState::Inactive,
            breached: false,
            store,
            storage_timeout,
            time,
            stats: ActivationStats::default(),
        }
    }

    /// The key this actor owns
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Current lifecycle state
    pub fn activation_state(&self) -> ActivationState {
        self.state
    }

    /// Statistics for the current activation
    pub fn stats(&self) -> &ActivationStats {
        &self.stats
    }

    fn transition(&mut self, next: ActivationState) {
        assert!(
            self.state.can_transition_to(next),
            "invalid lifecycle transition for {}: {} -> {}",
            self.key,
            self.state,
            next
        );
        self.state = next;
    }

    /// Hydrate the in-memory flag from the durable store
    ///
    /// Never fails: an unreadable record is treated as absent.
    #[instrument(skip(self), fields(key = %self.key), level = "info")]
    pub async fn activate(&mut self) {
        self.transition(ActivationState::Activating);

        let read = self.store_call("read", self.store.read(&self.key)).await;
        self.breached = match read {
            Ok(Some(record)) => record.breached,
            Ok(None) => {
                debug!(key = %self.key, "No existing record, using default");
                false
            }
            Err(e) => {
                let err = Error::ActorActivationFailed {
                    key: self.key.to_string(),
                    reason: e.to_string(),
                };
                warn!(key = %self.key, error = %err, "Failed to load state, using default");
                false
            }
        };

        self.stats = ActivationStats::with_time(self.time.as_ref());
        self.transition(ActivationState::Active);
        metrics::record_actor_activated();
        info!(key = %self.key, breached = self.breached, "Actor activated");
    }

    /// Release in-memory state without touching the store
    pub fn deactivate(&mut self) {
        if self.state != ActivationState::Active {
            return;
        }
        self.transition(ActivationState::Deactivating);
        self.breached = false;
        self.transition(ActivationState::Inactive);
        metrics::record_actor_deactivated();
        info!(
            key = %self.key,
            operations = self.stats.operation_count,
            errors = self.stats.error_count,
            "Actor deactivated"
        );
    }

    async fn ensure_active(&mut self) {
        if self.state == ActivationState::Inactive {
            self.activate().await;
        }
        debug_assert!(self.state.can_invoke());
    }

    /// Current flag
    pub async fn is_breached(&mut self) -> Result<bool> {
        self.ensure_active().await;
        Ok(self.breached)
    }

    /// Mark breached; `true` only when this call made the transition
    ///
    /// The flag flips only after the durable write succeeded.
    pub async fn add(&mut self) -> Result<bool> {
        self.ensure_active().await;
        if self.breached {
            return Ok(false);
        }

        let record = EntityState::breached(self.key.clone());
        let written = self
            .store_call("write", self.store.write(&self.key, &record))
            .await;
        match written {
            Ok(()) => {
                self.breached = true;
                Ok(true)
            }
            Err(e) => {
                self.invalidate(&e);
                Err(e)
            }
        }
    }

    /// Clear the durable record and reset the flag (idempotent)
    pub async fn remove(&mut self) -> Result<()> {
        self.ensure_active().await;

        let cleared = self.store_call("clear", self.store.clear(&self.key)).await;
        match cleared {
            Ok(()) => {
                self.breached = false;
                Ok(())
            }
            Err(e) => {
                self.invalidate(&e);
                Err(e)
            }
        }
    }

    /// Dispatch one mailbox operation
    #[instrument(skip(self), fields(key = %self.key, operation = %operation), level = "debug")]
    pub async fn handle(&mut self, operation: Operation) -> Result<bool> {
        let start_ms = self.time.monotonic_ms();

        let result = match operation {
            Operation::IsBreached => self.is_breached().await,
            Operation::Add => self.add().await,
            Operation::Remove => self.remove().await.map(|()| false),
        };

        let duration_ms = self.time.monotonic_ms().saturating_sub(start_ms);
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_operation(operation.name(), status, duration_ms as f64 / 1000.0);
        self.stats
            .record_operation_with_time(duration_ms, result.is_err(), self.time.as_ref());

        result
    }

    /// Drain the mailbox until every sender is gone, then deactivate
    pub async fn run(mut self, mut mailbox: MailboxReceiver) {
        while let Some(envelope) = mailbox.recv().await {
            let wait_ms = envelope.wait_time_ms_with_time(self.time.as_ref());
            if wait_ms > 0 {
                debug!(key = %self.key, wait_ms, "Dequeued operation");
            }
            let result = self.handle(envelope.operation).await;
            envelope.complete(result);
        }
        self.deactivate();
    }

    /// Drop the cached flag after a failed mutation so the next operation rehydrates
    fn invalidate(&mut self, cause: &Error) {
        error!(key = %self.key, error = %cause, "Persistence failed, invalidating actor");
        if self.state == ActivationState::Active {
            self.transition(ActivationState::Deactivating);
        }
        self.breached = false;
        self.transition(ActivationState::Inactive);
        metrics::record_actor_deactivated();
    }

    /// Run a store call under the storage timeout
    ///
    /// Every failure comes back as a persistence error for `operation`.
    async fn store_call<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start_ms = self.time.monotonic_ms();
        let outcome = tokio::time::timeout(self.storage_timeout, call).await;
        let duration_s = self.time.monotonic_ms().saturating_sub(start_ms) as f64 / 1000.0;

        match outcome {
            Ok(Ok(value)) => {
                metrics::record_store_operation(operation, "success", duration_s);
                Ok(value)
            }
            Ok(Err(e)) => {
                metrics::record_store_operation(operation, "error", duration_s);
                Err(self.as_persistence_error(operation, e))
            }
            Err(_) => {
                metrics::record_store_operation(operation, "timeout", duration_s);
                Err(Error::storage_timeout(
                    self.key.as_str(),
                    operation,
                    self.storage_timeout.as_millis() as u64,
                ))
            }
        }
    }

    fn as_persistence_error(&self, operation: &str, e: Error) -> Error {
        if e.is_persistence() {
            return e;
        }
        let reason = e.to_string();
        match operation {
            "read" => Error::storage_read_failed(self.key.as_str(), reason),
            "write" => Error::storage_write_failed(self.key.as_str(), reason),
            _ => Error::storage_clear_failed(self.key.as_str(), reason),
        }
    }
}

impl std::fmt::Debug for KeyActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyActor")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("breached", &self.breached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FlakyStore, ManualTime};
    use smartcache_storage::MemoryStore;

    fn key(s: &str) -> EntityKey {
        EntityKey::new(s).unwrap()
    }

    fn actor_with(store: Arc<dyn StateStore>, k: &str) -> KeyActor {
        KeyActor::new(
            key(k),
            store,
            Duration::from_millis(500),
            Arc::new(ManualTime::at(0)),
        )
    }

    #[test]
    fn test_activation_state_transitions() {
        use ActivationState::*;
        assert!(Inactive.can_transition_to(Activating));
        assert!(Activating.can_transition_to(Active));
        assert!(Active.can_transition_to(Deactivating));
        assert!(Deactivating.can_transition_to(Inactive));
        assert!(!Inactive.can_transition_to(Active));
        assert!(!Active.can_transition_to(Activating));
        assert!(Active.can_invoke());
        assert!(!Activating.can_invoke());
    }

    #[test]
    fn test_stats_idle_time() {
        let time = ManualTime::at(100);
        let mut stats = ActivationStats::with_time(&time);
        time.advance_ms(50);
        assert_eq!(stats.idle_time_ms(&time), 50);

        stats.record_operation_with_time(3, false, &time);
        time.advance_ms(20);
        assert_eq!(stats.idle_time_ms(&time), 20);
        assert_eq!(stats.operation_count, 1);
    }

    #[tokio::test]
    async fn test_fresh_key_is_not_breached() {
        let mut actor = actor_with(Arc::new(MemoryStore::new()), "new@example.com");
        assert_eq!(actor.activation_state(), ActivationState::Inactive);

        assert!(!actor.is_breached().await.unwrap());
        assert_eq!(actor.activation_state(), ActivationState::Active);
    }

    #[tokio::test]
    async fn test_activation_does_not_create_record() {
        let store = Arc::new(MemoryStore::new());
        let mut actor = actor_with(store.clone(), "new@example.com");
        actor.is_breached().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_add_then_add_again() {
        let store = Arc::new(MemoryStore::new());
        let mut actor = actor_with(store.clone(), "x@y.com");

        assert!(actor.add().await.unwrap());
        assert!(!actor.add().await.unwrap());
        assert!(actor.is_breached().await.unwrap());

        let record = store.read(&key("x@y.com")).await.unwrap().unwrap();
        assert!(record.breached);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let mut actor = actor_with(store.clone(), "x@y.com");

        actor.remove().await.unwrap();
        assert!(!actor.is_breached().await.unwrap());

        actor.add().await.unwrap();
        actor.remove().await.unwrap();
        actor.remove().await.unwrap();
        assert!(!actor.is_breached().await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_hydrates_existing_record() {
        let store = Arc::new(MemoryStore::new());
        let k = key("old@example.com");
        store.write(&k, &EntityState::breached(k.clone())).await.unwrap();

        let mut actor = actor_with(store, "old@example.com");
        assert!(actor.is_breached().await.unwrap());
        assert!(!actor.add().await.unwrap());
    }

    #[tokio::test]
    async fn test_read_failure_defaults_to_false() {
        let store = Arc::new(FlakyStore::new());
        store.fail_reads(true);
        let mut actor = actor_with(store, "x@y.com");

        assert!(!actor.is_breached().await.unwrap());
        assert_eq!(actor.activation_state(), ActivationState::Active);
    }

    #[tokio::test]
    async fn test_write_failure_leaves_flag_and_invalidates() {
        let store = Arc::new(FlakyStore::new());
        store.fail_writes(true);
        let mut actor = actor_with(store.clone(), "x@y.com");

        let err = actor.add().await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(actor.activation_state(), ActivationState::Inactive);

        store.fail_writes(false);
        assert!(!actor.is_breached().await.unwrap());
        assert_eq!(store.reads(), 2, "next operation must rehydrate");
        assert!(actor.add().await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_failure_keeps_durable_record() {
        let store = Arc::new(FlakyStore::new());
        let mut actor = actor_with(store.clone(), "x@y.com");
        actor.add().await.unwrap();

        store.fail_writes(true);
        assert!(actor.remove().await.unwrap_err().is_persistence());

        store.fail_writes(false);
        // Record is still durable, so rehydration sees it
        assert!(actor.is_breached().await.unwrap());
    }

    #[tokio::test]
    async fn test_write_timeout_is_persistence_error() {
        let store = Arc::new(FlakyStore::new());
        store.set_write_delay(Duration::from_millis(200));
        let mut actor = KeyActor::new(
            key("slow@example.com"),
            store,
            Duration::from_millis(20),
            Arc::new(ManualTime::at(0)),
        );

        let err = actor.add().await.unwrap_err();
        assert!(matches!(err, Error::StorageTimeout { .. }));
        assert_eq!(actor.activation_state(), ActivationState::Inactive);
    }

    #[tokio::test]
    async fn test_deactivate_does_not_write() {
        let store = Arc::new(FlakyStore::new());
        let mut actor = actor_with(store.clone(), "x@y.com");
        actor.add().await.unwrap();
        let writes = store.writes();

        actor.deactivate();
        assert_eq!(actor.activation_state(), ActivationState::Inactive);
        assert_eq!(store.writes(), writes);
    }
}
