//! Key handles for external invocations
//!
//! TigerStyle: Location-transparent references with explicit error handling.

use crate::directory::ActorDirectory;
use crate::mailbox::Operation;
use smartcache_core::error::{Error, Result};
use smartcache_core::EntityKey;
use std::sync::Arc;
use std::time::Duration;

/// Handle to a key's actor
///
/// The handle does not pin the actor: if the actor is evicted between calls,
/// the next call transparently reactivates it. Handles can be cloned and
/// shared across tasks.
#[derive(Clone)]
pub struct ActorHandle {
    key: EntityKey,
    directory: Arc<ActorDirectory>,
    default_timeout: Option<Duration>,
}

impl ActorHandle {
    /// Create a new handle
    pub fn new(key: EntityKey, directory: Arc<ActorDirectory>) -> Self {
        Self {
            key,
            directory,
            default_timeout: None,
        }
    }

    /// Create a handle whose calls fail with `OperationTimedOut` past `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// The key this handle addresses
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Whether the key is currently marked breached
    pub async fn is_breached(&self) -> Result<bool> {
        self.invoke(Operation::IsBreached).await
    }

    /// Mark the key breached; `true` only if it was not already
    pub async fn add(&self) -> Result<bool> {
        self.invoke(Operation::Add).await
    }

    /// Clear the key's breached flag and durable record
    pub async fn remove(&self) -> Result<()> {
        self.invoke(Operation::Remove).await.map(|_| ())
    }

    /// Evict the actor now if it is idle
    ///
    /// The actor will be reactivated on the next invocation.
    pub fn deactivate(&self) -> bool {
        self.directory.deactivate(&self.key)
    }

    async fn invoke(&self, operation: Operation) -> Result<bool> {
        match self.default_timeout {
            Some(timeout) => tokio::time::timeout(
                timeout,
                self.directory.invoke(&self.key, operation),
            )
            .await
            .map_err(|_| Error::OperationTimedOut {
                key: self.key.to_string(),
                operation: operation.name().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })?,
            None => self.directory.invoke(&self.key, operation).await,
        }
    }
}

impl std::fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorHandle")
            .field("key", &self.key)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}
