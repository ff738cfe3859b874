//! Durable state store trait
//!
//! TigerStyle: Three explicit operations, absence is not an error.

use async_trait::async_trait;
use smartcache_core::{EntityKey, EntityState, Result};

/// Persistent backing store for entity records
///
/// Implementations must be safe to call concurrently for different keys.
/// The runtime never issues two calls for the same key at once.
#[async_trait]
pub trait StateStore: Send + Sync + std::fmt::Debug {
    /// Read the record for `key`, `None` if it was never written or was cleared
    async fn read(&self, key: &EntityKey) -> Result<Option<EntityState>>;

    /// Durably store `state` for `key`, replacing any previous record
    async fn write(&self, key: &EntityKey, state: &EntityState) -> Result<()>;

    /// Remove the record for `key`; succeeds when no record exists
    async fn clear(&self, key: &EntityKey) -> Result<()>;
}
