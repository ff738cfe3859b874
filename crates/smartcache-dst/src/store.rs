//! Simulated state store with fault injection
//!
//! TigerStyle: Deterministic storage, every call counted.
//!
//! Records are held as encoded JSON bytes so corruption faults exercise the
//! real decode path. Latency faults delay for real time, which is what the
//! runtime's storage timeout measures, and advance the simulation clock by
//! the same amount.

use crate::clock::SimClock;
use crate::fault::{FaultInjector, FaultType};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use smartcache_core::{EntityKey, EntityState, Error, Result};
use smartcache_storage::StateStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicU64,
    writes: AtomicU64,
    clears: AtomicU64,
}

/// In-memory [`StateStore`] driven by a [`FaultInjector`]
///
/// Clones share the same records, so a second runtime built over a clone
/// sees everything the first one persisted.
#[derive(Debug, Clone)]
pub struct SimStore {
    data: Arc<Mutex<HashMap<EntityKey, Bytes>>>,
    faults: Arc<FaultInjector>,
    clock: Arc<SimClock>,
    counters: Arc<Counters>,
}

impl SimStore {
    pub fn new(faults: Arc<FaultInjector>, clock: Arc<SimClock>) -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            faults,
            clock,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Store a record directly, bypassing faults and counters
    pub fn seed(&self, state: &EntityState) -> Result<()> {
        let bytes = Bytes::from(state.to_json()?);
        self.data.lock().insert(state.key.clone(), bytes);
        Ok(())
    }

    /// Whether a record exists for `key`
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Number of stored records
    pub fn record_count(&self) -> usize {
        self.data.lock().len()
    }

    pub fn reads(&self) -> u64 {
        self.counters.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.counters.writes.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> u64 {
        self.counters.clears.load(Ordering::SeqCst)
    }

    async fn delay(&self, min_ms: u64, max_ms: u64) {
        let ms = self.faults.latency_ms(min_ms, max_ms);
        self.clock.advance_ms(ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait]
impl StateStore for SimStore {
    async fn read(&self, key: &EntityKey) -> Result<Option<EntityState>> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);

        match self.faults.should_inject("storage_read") {
            Some(FaultType::StorageReadFail) => {
                return Err(Error::storage_read_failed(key.as_str(), "injected read fault"));
            }
            Some(FaultType::StorageCorruption) => {
                return EntityState::from_json(b"\x00corrupt").map(Some);
            }
            Some(FaultType::StorageLatency { min_ms, max_ms }) => {
                self.delay(min_ms, max_ms).await;
            }
            _ => {}
        }

        let bytes = self.data.lock().get(key).cloned();
        bytes.map(|b| EntityState::from_json(&b)).transpose()
    }

    async fn write(&self, key: &EntityKey, state: &EntityState) -> Result<()> {
        self.counters.writes.fetch_add(1, Ordering::SeqCst);

        match self.faults.should_inject("storage_write") {
            Some(FaultType::StorageWriteFail) => {
                return Err(Error::storage_write_failed(key.as_str(), "injected write fault"));
            }
            Some(FaultType::DiskFull) => {
                return Err(Error::storage_write_failed(key.as_str(), "disk full"));
            }
            Some(FaultType::StorageLatency { min_ms, max_ms }) => {
                self.delay(min_ms, max_ms).await;
            }
            _ => {}
        }

        let bytes = Bytes::from(state.to_json()?);
        self.data.lock().insert(key.clone(), bytes);
        Ok(())
    }

    async fn clear(&self, key: &EntityKey) -> Result<()> {
        self.counters.clears.fetch_add(1, Ordering::SeqCst);

        match self.faults.should_inject("storage_clear") {
            Some(FaultType::StorageWriteFail) => {
                return Err(Error::storage_clear_failed(key.as_str(), "injected clear fault"));
            }
            Some(FaultType::StorageLatency { min_ms, max_ms }) => {
                self.delay(min_ms, max_ms).await;
            }
            _ => {}
        }

        self.data.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultConfig, FaultInjectorBuilder};
    use crate::rng::DeterministicRng;

    fn store(faults: Vec<FaultConfig>) -> SimStore {
        let mut builder = FaultInjectorBuilder::new(DeterministicRng::new(42));
        for fault in faults {
            builder = builder.with_fault(fault);
        }
        SimStore::new(Arc::new(builder.build()), Arc::new(SimClock::from_millis(0)))
    }

    fn key(s: &str) -> EntityKey {
        EntityKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_without_faults() {
        let store = store(vec![]);
        let k = key("x@y.com");
        store.write(&k, &EntityState::breached(k.clone())).await.unwrap();
        assert!(store.read(&k).await.unwrap().unwrap().breached);
        store.clear(&k).await.unwrap();
        assert!(store.read(&k).await.unwrap().is_none());
        assert_eq!((store.reads(), store.writes(), store.clears()), (2, 1, 1));
    }

    #[tokio::test]
    async fn test_write_fault_leaves_no_record() {
        let store = store(vec![FaultConfig::new(FaultType::StorageWriteFail, 1.0)
            .with_filter("storage_write")]);
        let k = key("x@y.com");
        let result = store.write(&k, &EntityState::breached(k.clone())).await;
        assert!(matches!(result, Err(Error::StorageWriteFailed { .. })));
        assert!(!store.contains(&k));
    }

    #[tokio::test]
    async fn test_corruption_fails_decode() {
        let store = store(vec![FaultConfig::new(FaultType::StorageCorruption, 1.0)]);
        let k = key("x@y.com");
        store.seed(&EntityState::breached(k.clone())).unwrap();
        assert!(store.read(&k).await.is_err());
    }

    #[tokio::test]
    async fn test_latency_advances_clock() {
        let clock = Arc::new(SimClock::from_millis(0));
        let injector = FaultInjectorBuilder::new(DeterministicRng::new(1))
            .with_fault(FaultConfig::new(
                FaultType::StorageLatency {
                    min_ms: 5,
                    max_ms: 5,
                },
                1.0,
            ))
            .build();
        let store = SimStore::new(Arc::new(injector), clock.clone());

        store.read(&key("x@y.com")).await.unwrap();
        assert_eq!(clock.now_ms(), 5);
    }
}
