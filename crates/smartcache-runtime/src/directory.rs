//! Actor directory and lifecycle manager
//!
//! TigerStyle: At most one live actor per key, eviction never races work.
//!
//! The directory maps keys to running [`KeyActor`] tasks. The map is split
//! into independently locked shards; a shard lock is held only for a lookup,
//! insert or remove and never across an await.
//!
//! # Single activation
//!
//! The first reference to a key inserts its entry and spawns the actor task
//! under the shard lock, so concurrent first callers all land in the same
//! mailbox. Hydration runs inside the actor before it serves the first
//! message; later callers queue behind it.
//!
//! # Eviction
//!
//! Each entry carries a pending-work counter that callers raise under the
//! shard lock before enqueueing. The raised slot rides in the envelope and is
//! released by the actor after the operation has run, so a caller that stops
//! waiting never makes a busy actor look idle. Eviction removes an entry only
//! while holding the same lock and only when that counter is zero, so an
//! operation can never be stranded in a mailbox that is being torn down and
//! a second actor can never start while the first still talks to the store.
//! Removing the entry drops the directory's mailbox sender; the actor drains
//! and deactivates.

use crate::activation::KeyActor;
use crate::handle::ActorHandle;
use crate::mailbox::{mailbox, Envelope, MailboxSender, Operation};
use parking_lot::Mutex;
use smartcache_core::config::ActorConfig;
use smartcache_core::error::{Error, Result};
use smartcache_core::io::TimeProvider;
use smartcache_core::EntityKey;
use smartcache_storage::StateStore;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

/// Activity bookkeeping shared between an entry and its in-flight callers
#[derive(Debug)]
struct Activity {
    /// Operations enqueued or executing
    pending: AtomicUsize,
    /// Last time an operation completed (or the entry was created)
    last_access_ms: AtomicU64,
}

impl Activity {
    fn new(now_ms: u64) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            last_access_ms: AtomicU64::new(now_ms),
        }
    }

    fn is_idle(&self, now_ms: u64, collection_age_ms: u64) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
            && now_ms.saturating_sub(self.last_access_ms.load(Ordering::SeqCst))
                >= collection_age_ms
    }
}

/// Guard that refreshes the access time and releases pending work on drop
///
/// Owned by the envelope, so it is dropped by the actor once the operation
/// has finished (or with the envelope if it never reached the mailbox).
#[derive(Debug)]
pub(crate) struct PendingGuard {
    activity: Arc<Activity>,
    time: Arc<dyn TimeProvider>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        // Touch before releasing so a sweep never sees pending == 0 with a stale time
        self.activity
            .last_access_ms
            .store(self.time.now_ms(), Ordering::SeqCst);
        self.activity.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A live actor in the directory
struct KeyEntry {
    mailbox_tx: MailboxSender,
    activity: Arc<Activity>,
}

/// Point-in-time directory counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryStats {
    /// Actors currently in the directory
    pub active_count: usize,
    /// Actors created since start
    pub activations_total: u64,
    /// Actors removed by sweeps or explicit deactivation
    pub evictions_total: u64,
}

/// Key -> actor map with lazy activation and idle eviction
pub struct ActorDirectory {
    shards: Vec<Mutex<HashMap<EntityKey, KeyEntry>>>,
    store: Arc<dyn StateStore>,
    time: Arc<dyn TimeProvider>,
    config: ActorConfig,
    activations_total: AtomicU64,
    evictions_total: AtomicU64,
    shut_down: AtomicBool,
}

impl ActorDirectory {
    /// Create an empty directory
    pub fn new(
        store: Arc<dyn StateStore>,
        time: Arc<dyn TimeProvider>,
        config: ActorConfig,
    ) -> Self {
        assert!(config.directory_shards_count > 0, "shard count must be positive");
        assert!(config.mailbox_depth_max > 0, "mailbox depth must be positive");

        let shards = (0..config.directory_shards_count)
            .map(|_| Mutex::new(HashMap::new()))
            .collect();

        Self {
            shards,
            store,
            time,
            config,
            activations_total: AtomicU64::new(0),
            evictions_total: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Actor lifecycle configuration
    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    fn shard_for(&self, key: &EntityKey) -> &Mutex<HashMap<EntityKey, KeyEntry>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    /// Insert and start an actor for `key`; caller holds the shard lock
    fn spawn_entry(&self, key: &EntityKey) -> KeyEntry {
        let (mailbox_tx, mailbox_rx) = mailbox(self.config.mailbox_depth_max);
        let actor = KeyActor::new(
            key.clone(),
            self.store.clone(),
            Duration::from_millis(self.config.storage_timeout_ms),
            self.time.clone(),
        );
        tokio::spawn(actor.run(mailbox_rx));

        self.activations_total.fetch_add(1, Ordering::SeqCst);
        debug!(key = %key, "Started actor");

        KeyEntry {
            mailbox_tx,
            activity: Arc::new(Activity::new(self.time.now_ms())),
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(Error::RuntimeShutdown);
        }
        Ok(())
    }

    /// Live entry for `key`, spawning the actor if needed
    ///
    /// Must be called with the shard lock held. The shutdown flag is read
    /// under that lock, so an insert cannot slip in behind `shutdown()`
    /// clearing the shard.
    fn entry_locked<'a>(
        &self,
        shard: &'a mut HashMap<EntityKey, KeyEntry>,
        key: &EntityKey,
    ) -> Result<&'a KeyEntry> {
        self.ensure_running()?;
        let entry = shard
            .entry(key.clone())
            .or_insert_with(|| self.spawn_entry(key));
        Ok(entry)
    }

    /// Return a handle to the live actor for `key`, starting one if needed
    pub fn get_or_activate(self: &Arc<Self>, key: &EntityKey) -> Result<ActorHandle> {
        {
            let mut shard = self.shard_for(key).lock();
            self.entry_locked(&mut shard, key)?;
        }
        Ok(ActorHandle::new(key.clone(), self.clone()))
    }

    /// Reserve a slot in `key`'s mailbox, starting the actor if needed
    fn acquire(&self, key: &EntityKey) -> Result<(MailboxSender, PendingGuard)> {
        let mut shard = self.shard_for(key).lock();
        let entry = self.entry_locked(&mut shard, key)?;

        entry.activity.pending.fetch_add(1, Ordering::SeqCst);
        let guard = PendingGuard {
            activity: entry.activity.clone(),
            time: self.time.clone(),
        };
        Ok((entry.mailbox_tx.clone(), guard))
    }

    /// Run `operation` on `key`'s actor and wait for the reply
    #[instrument(skip(self), fields(key = %key, operation = %operation), level = "debug")]
    pub async fn invoke(&self, key: &EntityKey, operation: Operation) -> Result<bool> {
        let (mailbox_tx, pending) = self.acquire(key)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope::new_with_time(operation, reply_tx, self.time.as_ref())
            .with_pending(pending);

        let sent = mailbox_tx.try_send(envelope);
        // Only the directory entry may keep the mailbox open
        drop(mailbox_tx);
        sent.map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::ActorMailboxFull {
                key: key.to_string(),
                depth: self.config.mailbox_depth_max,
                max: self.config.mailbox_depth_max,
            },
            mpsc::error::TrySendError::Closed(_) => {
                Error::internal(format!("actor mailbox closed for {}", key))
            }
        })?;

        reply_rx
            .await
            .map_err(|_| Error::internal(format!("actor for {} dropped the reply", key)))?
    }

    /// Evict every actor idle for at least `collection_age_ms` with no pending work
    ///
    /// Returns the number of evicted actors.
    pub fn sweep_idle(&self) -> usize {
        let now_ms = self.time.now_ms();
        let age_ms = self.config.collection_age_ms;
        let mut evicted = 0;

        for shard in &self.shards {
            let mut map = shard.lock();
            map.retain(|key, entry| {
                let idle = entry.activity.is_idle(now_ms, age_ms);
                if idle {
                    debug!(key = %key, "Evicting idle actor");
                    evicted += 1;
                }
                !idle
            });
        }

        if evicted > 0 {
            self.evictions_total
                .fetch_add(evicted as u64, Ordering::SeqCst);
            info!(evicted, remaining = self.active_count(), "Idle sweep completed");
        }
        evicted
    }

    /// Evict `key` now if it has no pending work
    ///
    /// Returns whether an actor was removed.
    pub fn deactivate(&self, key: &EntityKey) -> bool {
        let mut shard = self.shard_for(key).lock();
        let removable = shard
            .get(key)
            .map(|entry| entry.activity.pending.load(Ordering::SeqCst) == 0)
            .unwrap_or(false);

        if removable {
            shard.remove(key);
            self.evictions_total.fetch_add(1, Ordering::SeqCst);
            debug!(key = %key, "Deactivated actor");
        }
        removable
    }

    /// Refuse new work and release every actor
    ///
    /// Operations already enqueued still complete.
    pub fn shutdown(&self) -> usize {
        self.shut_down.store(true, Ordering::SeqCst);
        let mut released = 0;
        for shard in &self.shards {
            let mut map = shard.lock();
            released += map.len();
            map.clear();
        }
        info!(released, "Actor directory shut down");
        released
    }

    /// Whether `key` currently has a live actor
    pub fn is_active(&self, key: &EntityKey) -> bool {
        self.shard_for(key).lock().contains_key(key)
    }

    /// Number of live actors
    pub fn active_count(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    /// Snapshot of the directory counters
    pub fn stats(&self) -> DirectoryStats {
        DirectoryStats {
            active_count: self.active_count(),
            activations_total: self.activations_total.load(Ordering::SeqCst),
            evictions_total: self.evictions_total.load(Ordering::SeqCst),
        }
    }
}

impl std::fmt::Debug for ActorDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorDirectory")
            .field("shards", &self.shards.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FlakyStore, ManualTime};
    use futures::future::join_all;

    fn key(s: &str) -> EntityKey {
        EntityKey::new(s).unwrap()
    }

    fn config() -> ActorConfig {
        ActorConfig {
            collection_age_ms: 1_000,
            directory_shards_count: 4,
            ..Default::default()
        }
    }

    fn directory(store: Arc<FlakyStore>, time: Arc<ManualTime>) -> Arc<ActorDirectory> {
        Arc::new(ActorDirectory::new(store, time, config()))
    }

    #[tokio::test]
    async fn test_invoke_activates_once() {
        let store = Arc::new(FlakyStore::new());
        let dir = directory(store.clone(), Arc::new(ManualTime::at(0)));
        let k = key("x@y.com");

        assert!(dir.invoke(&k, Operation::Add).await.unwrap());
        assert!(!dir.invoke(&k, Operation::Add).await.unwrap());
        assert!(dir.invoke(&k, Operation::IsBreached).await.unwrap());

        assert_eq!(store.reads(), 1);
        assert_eq!(dir.stats().activations_total, 1);
        assert!(dir.is_active(&k));
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_activation() {
        let store = Arc::new(FlakyStore::new());
        let dir = directory(store.clone(), Arc::new(ManualTime::at(0)));
        let k = key("race@example.com");

        let calls = (0..32).map(|_| {
            let dir = dir.clone();
            let k = k.clone();
            async move { dir.invoke(&k, Operation::Add).await }
        });
        let results: Vec<bool> = join_all(calls)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|added| **added).count(), 1);
        assert_eq!(store.reads(), 1);
        assert_eq!(dir.active_count(), 1);
    }

    #[tokio::test]
    async fn test_sweep_respects_collection_age() {
        let time = Arc::new(ManualTime::at(0));
        let dir = directory(Arc::new(FlakyStore::new()), time.clone());
        let k = key("idle@example.com");
        dir.invoke(&k, Operation::IsBreached).await.unwrap();

        time.advance_ms(999);
        assert_eq!(dir.sweep_idle(), 0);

        time.advance_ms(1);
        assert_eq!(dir.sweep_idle(), 1);
        assert!(!dir.is_active(&k));
        assert_eq!(dir.stats().evictions_total, 1);
    }

    #[tokio::test]
    async fn test_access_refreshes_idle_timer() {
        let time = Arc::new(ManualTime::at(0));
        let dir = directory(Arc::new(FlakyStore::new()), time.clone());
        let k = key("busy@example.com");
        dir.invoke(&k, Operation::IsBreached).await.unwrap();

        time.advance_ms(800);
        dir.invoke(&k, Operation::IsBreached).await.unwrap();
        time.advance_ms(800);

        assert_eq!(dir.sweep_idle(), 0);
        assert!(dir.is_active(&k));
    }

    #[tokio::test]
    async fn test_sweep_skips_pending_work() {
        let time = Arc::new(ManualTime::at(0));
        let store = Arc::new(FlakyStore::new());
        store.set_write_delay(Duration::from_millis(100));
        let dir = directory(store, time.clone());
        let k = key("slow@example.com");

        let pending = {
            let dir = dir.clone();
            let k = k.clone();
            tokio::spawn(async move { dir.invoke(&k, Operation::Add).await })
        };
        // Let the add reach the store
        tokio::time::sleep(Duration::from_millis(20)).await;

        time.advance_ms(10_000);
        assert_eq!(dir.sweep_idle(), 0, "in-flight work must block eviction");
        assert!(!dir.deactivate(&k));

        assert!(pending.await.unwrap().unwrap());
        time.advance_ms(10_000);
        assert_eq!(dir.sweep_idle(), 1);
    }

    #[tokio::test]
    async fn test_timed_out_caller_does_not_release_busy_actor() {
        let time = Arc::new(ManualTime::at(0));
        let store = Arc::new(FlakyStore::new());
        store.set_write_delay(Duration::from_millis(200));
        let dir = directory(store.clone(), time.clone());
        let k = key("slow@example.com");

        let handle = dir
            .get_or_activate(&k)
            .unwrap()
            .with_timeout(Duration::from_millis(20));
        assert!(matches!(
            handle.add().await,
            Err(Error::OperationTimedOut { .. })
        ));

        // The write is still running inside the actor
        time.advance_ms(5_000);
        assert_eq!(dir.sweep_idle(), 0, "actor is still writing");
        assert!(!dir.deactivate(&k));

        // A new caller queues behind the write on the same actor
        assert!(!dir.invoke(&k, Operation::Add).await.unwrap());
        assert_eq!(dir.stats().activations_total, 1);
        assert_eq!(store.writes(), 1);

        time.advance_ms(5_000);
        assert_eq!(dir.sweep_idle(), 1);
    }

    #[tokio::test]
    async fn test_dropped_caller_keeps_work_pending() {
        let time = Arc::new(ManualTime::at(0));
        let store = Arc::new(FlakyStore::new());
        store.set_write_delay(Duration::from_millis(100));
        let dir = directory(store.clone(), time.clone());
        let k = key("gone@example.com");

        let caller = {
            let (dir, k) = (dir.clone(), k.clone());
            tokio::spawn(async move { dir.invoke(&k, Operation::Add).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        caller.abort();
        let _ = caller.await;

        time.advance_ms(5_000);
        assert_eq!(dir.sweep_idle(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(dir.invoke(&k, Operation::IsBreached).await.unwrap());
        assert_eq!(dir.stats().activations_total, 1);
    }

    #[tokio::test]
    async fn test_reactivation_after_eviction_rehydrates() {
        let time = Arc::new(ManualTime::at(0));
        let store = Arc::new(FlakyStore::new());
        let dir = directory(store.clone(), time.clone());
        let k = key("x@y.com");

        dir.invoke(&k, Operation::Add).await.unwrap();
        time.advance_ms(5_000);
        dir.sweep_idle();
        let writes = store.writes();

        assert!(dir.invoke(&k, Operation::IsBreached).await.unwrap());
        assert_eq!(store.reads(), 2);
        assert_eq!(store.writes(), writes, "eviction must not write");
        assert_eq!(dir.stats().activations_total, 2);
    }

    #[tokio::test]
    async fn test_explicit_deactivate() {
        let dir = directory(Arc::new(FlakyStore::new()), Arc::new(ManualTime::at(0)));
        let k = key("x@y.com");
        assert!(!dir.deactivate(&k));

        dir.get_or_activate(&k).unwrap();
        assert!(dir.is_active(&k));
        assert!(dir.deactivate(&k));
        assert!(!dir.is_active(&k));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_work() {
        let dir = directory(Arc::new(FlakyStore::new()), Arc::new(ManualTime::at(0)));
        let k = key("x@y.com");
        dir.invoke(&k, Operation::Add).await.unwrap();

        assert_eq!(dir.shutdown(), 1);
        assert_eq!(dir.active_count(), 0);
        assert!(matches!(
            dir.invoke(&k, Operation::IsBreached).await,
            Err(Error::RuntimeShutdown)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_activation_after_shutdown() {
        let dir = directory(Arc::new(FlakyStore::new()), Arc::new(ManualTime::at(0)));

        let callers: Vec<_> = (0..64)
            .map(|i| {
                let dir = dir.clone();
                tokio::spawn(async move {
                    let k = key(&format!("user{}@example.com", i));
                    let _ = dir.invoke(&k, Operation::IsBreached).await;
                })
            })
            .collect();
        dir.shutdown();
        for caller in callers {
            caller.await.unwrap();
        }

        assert_eq!(dir.active_count(), 0, "no entry may survive shutdown");
        assert!(dir.get_or_activate(&key("late@example.com")).is_err());
        assert_eq!(dir.active_count(), 0);
    }

    #[tokio::test]
    async fn test_mailbox_full_is_reported() {
        let store = Arc::new(FlakyStore::new());
        store.set_write_delay(Duration::from_millis(200));
        let dir = Arc::new(ActorDirectory::new(
            store,
            Arc::new(ManualTime::at(0)),
            ActorConfig {
                mailbox_depth_max: 1,
                directory_shards_count: 1,
                ..Default::default()
            },
        ));
        let k = key("hot@example.com");

        // First add occupies the actor, second fills the mailbox, third overflows
        let first = {
            let (dir, k) = (dir.clone(), k.clone());
            tokio::spawn(async move { dir.invoke(&k, Operation::Add).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let (dir, k) = (dir.clone(), k.clone());
            tokio::spawn(async move { dir.invoke(&k, Operation::Add).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let third = dir.invoke(&k, Operation::Add).await;
        assert!(matches!(third, Err(Error::ActorMailboxFull { .. })));

        assert!(first.await.unwrap().unwrap());
        assert!(!second.await.unwrap().unwrap());
    }
}
