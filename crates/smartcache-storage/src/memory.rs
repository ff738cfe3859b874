//! In-memory state store
//!
//! For testing and single-process deployments without durability needs.
//!
//! Records are kept in their JSON wire form so the store exercises the same
//! encode/decode path as the file backend.

use crate::store::StateStore;
use async_trait::async_trait;
use bytes::Bytes;
use smartcache_core::{EntityKey, EntityState, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

/// In-memory store: key -> encoded record
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<EntityKey, Bytes>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// True when no records are stored
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    #[instrument(skip(self), fields(key = %key))]
    async fn read(&self, key: &EntityKey) -> Result<Option<EntityState>> {
        let data = self.data.read().await;
        data.get(key)
            .map(|bytes| EntityState::from_json(bytes))
            .transpose()
    }

    #[instrument(skip(self, state), fields(key = %key, breached = state.breached))]
    async fn write(&self, key: &EntityKey, state: &EntityState) -> Result<()> {
        let bytes = Bytes::from(state.to_json()?);
        let mut data = self.data.write().await;
        data.insert(key.clone(), bytes);
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn clear(&self, key: &EntityKey) -> Result<()> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }
}
