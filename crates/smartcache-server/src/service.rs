//! Breach service
//!
//! The request-facing layer over the runtime. Keys are checked here before
//! any actor sees them: mutations that create records require a well-formed
//! email, reads and removals only require a usable key.

use crate::validation::is_valid_email;
use smartcache_core::{EntityKey, Error, Result};
use smartcache_runtime::{BatchResult, DirectoryStats, Runtime};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Check / add / batch add / remove over the actor runtime
#[derive(Debug, Clone)]
pub struct BreachService {
    runtime: Arc<Runtime>,
}

impl BreachService {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self { runtime }
    }

    /// The underlying runtime
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    fn email_key(email: &str) -> Result<EntityKey> {
        if !is_valid_email(email) {
            return Err(Error::validation_failed(email, "invalid email format"));
        }
        EntityKey::new(email)
    }

    /// Whether `email` is breached
    #[instrument(skip(self), level = "debug")]
    pub async fn check(&self, email: &str) -> Result<bool> {
        let key = EntityKey::new(email)?;
        self.runtime.is_breached(&key).await
    }

    /// Mark `email` breached; `false` if it already was
    #[instrument(skip(self), level = "debug")]
    pub async fn add(&self, email: &str) -> Result<bool> {
        let key = Self::email_key(email)?;
        let added = self.runtime.add(&key).await?;
        debug!(email, added, "Add completed");
        Ok(added)
    }

    /// Mark every well-formed email breached
    ///
    /// Malformed entries are reported in `invalid` and never dispatched.
    #[instrument(skip(self, emails), fields(count = emails.len()))]
    pub async fn add_batch(&self, emails: &[String]) -> Result<BatchResult> {
        if emails.is_empty() {
            return Err(Error::validation_failed("[]", "email list is empty"));
        }
        self.runtime.add_many_with(emails, is_valid_email).await
    }

    /// Clear `email`
    #[instrument(skip(self), level = "debug")]
    pub async fn remove(&self, email: &str) -> Result<()> {
        let key = EntityKey::new(email)?;
        self.runtime.remove(&key).await
    }

    /// Directory counters
    pub fn stats(&self) -> DirectoryStats {
        self.runtime.stats()
    }
}
