//! Test doubles shared by the unit tests in this crate

use async_trait::async_trait;
use smartcache_core::{EntityKey, EntityState, Error, Result, TimeProvider};
use smartcache_storage::{MemoryStore, StateStore};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct ManualTime {
    now_ms: AtomicU64,
}

impl ManualTime {
    pub fn at(ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(ms),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl TimeProvider for ManualTime {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    async fn sleep_ms(&self, ms: u64) {
        self.advance_ms(ms);
        tokio::task::yield_now().await;
    }
}

/// MemoryStore with switchable failures, write latency and call counters
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_delay_ms: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    /// Fails both writes and clears
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    async fn delay_write(&self) {
        let ms = self.write_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    async fn read(&self, key: &EntityKey) -> Result<Option<EntityState>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::storage_read_failed(key.as_str(), "injected"));
        }
        self.inner.read(key).await
    }

    async fn write(&self, key: &EntityKey, state: &EntityState) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.delay_write().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage_write_failed(key.as_str(), "injected"));
        }
        self.inner.write(key, state).await
    }

    async fn clear(&self, key: &EntityKey) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.delay_write().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage_clear_failed(key.as_str(), "injected"));
        }
        self.inner.clear(key).await
    }
}
