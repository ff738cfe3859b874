//! Batch fan-out over key actors
//!
//! TigerStyle: Per-key failure isolation, bounded concurrency.
//!
//! A batch is deduplicated, filtered, and then fanned out to the per-key
//! actors with at most `concurrency_max` operations in flight. Every key
//! lands in exactly one outcome bucket; a failure on one key never cancels
//! the others.

use crate::directory::ActorDirectory;
use crate::mailbox::Operation;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use smartcache_core::config::BatchConfig;
use smartcache_core::error::{Error, Result};
use smartcache_core::EntityKey;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A key whose operation failed, with the failure text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub key: String,
    pub reason: String,
}

impl BatchFailure {
    fn new(key: &EntityKey, error: &Error) -> Self {
        Self {
            key: key.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Outcome of [`BatchCoordinator::add_many`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Keys that transitioned to breached
    pub added: Vec<String>,
    /// Keys that were already breached
    pub already_breached: Vec<String>,
    /// Keys rejected before dispatch
    pub invalid: Vec<String>,
    /// Keys whose write could not be confirmed
    pub failed: Vec<BatchFailure>,
}

impl BatchResult {
    /// Order every bucket by key
    pub fn sorted(mut self) -> Self {
        self.added.sort();
        self.already_breached.sort();
        self.invalid.sort();
        self.failed.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }

    /// Number of distinct keys accounted for
    pub fn total(&self) -> usize {
        self.added.len() + self.already_breached.len() + self.invalid.len() + self.failed.len()
    }
}

/// Outcome of [`BatchCoordinator::remove_many`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResult {
    pub removed: Vec<String>,
    pub invalid: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl RemoveResult {
    /// Order every bucket by key
    pub fn sorted(mut self) -> Self {
        self.removed.sort();
        self.invalid.sort();
        self.failed.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }
}

/// Outcome of [`BatchCoordinator::check_many`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub breached: Vec<String>,
    pub not_breached: Vec<String>,
    pub invalid: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl CheckResult {
    /// Order every bucket by key
    pub fn sorted(mut self) -> Self {
        self.breached.sort();
        self.not_breached.sort();
        self.invalid.sort();
        self.failed.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }
}

/// Keys split into dispatchable and rejected
struct Prepared {
    keys: Vec<EntityKey>,
    invalid: Vec<String>,
}

/// Fans batches of keys out to their actors
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    directory: Arc<ActorDirectory>,
    config: BatchConfig,
}

impl BatchCoordinator {
    /// Create a coordinator over `directory`
    pub fn new(directory: Arc<ActorDirectory>, config: BatchConfig) -> Self {
        assert!(config.concurrency_max > 0, "batch concurrency must be positive");
        Self { directory, config }
    }

    /// Batch configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Deduplicate, validate and bound a raw batch
    fn prepare<F>(&self, keys: &[String], validator: F) -> Result<Prepared>
    where
        F: Fn(&str) -> bool,
    {
        if keys.len() > self.config.keys_count_max {
            return Err(Error::BatchTooLarge {
                count: keys.len(),
                limit: self.config.keys_count_max,
            });
        }

        let mut seen = HashSet::with_capacity(keys.len());
        let mut prepared = Prepared {
            keys: Vec::with_capacity(keys.len()),
            invalid: Vec::new(),
        };

        for raw in keys {
            if !seen.insert(raw.as_str()) {
                continue;
            }
            if !validator(raw) {
                prepared.invalid.push(raw.clone());
                continue;
            }
            match EntityKey::new(raw.as_str()) {
                Ok(key) => prepared.keys.push(key),
                Err(_) => prepared.invalid.push(raw.clone()),
            }
        }
        Ok(prepared)
    }

    /// Run `operation` on every key with bounded concurrency
    async fn fan_out(
        &self,
        keys: Vec<EntityKey>,
        operation: Operation,
    ) -> Vec<(EntityKey, Result<bool>)> {
        stream::iter(keys)
            .map(|key| {
                let directory = self.directory.clone();
                async move {
                    let outcome = directory.invoke(&key, operation).await;
                    (key, outcome)
                }
            })
            .buffer_unordered(self.config.concurrency_max)
            .collect()
            .await
    }

    /// Mark every key breached
    pub async fn add_many(&self, keys: &[String]) -> Result<BatchResult> {
        self.add_many_with(keys, |_| true).await
    }

    /// Mark every key passing `validator` breached
    ///
    /// Keys failing `validator` (or the key rules) go to `invalid` and never
    /// reach an actor.
    #[instrument(skip(self, keys, validator), fields(count = keys.len()))]
    pub async fn add_many_with<F>(&self, keys: &[String], validator: F) -> Result<BatchResult>
    where
        F: Fn(&str) -> bool,
    {
        let prepared = self.prepare(keys, validator)?;
        let mut result = BatchResult {
            invalid: prepared.invalid,
            ..Default::default()
        };

        for (key, outcome) in self.fan_out(prepared.keys, Operation::Add).await {
            match outcome {
                Ok(true) => result.added.push(key.into_inner()),
                Ok(false) => result.already_breached.push(key.into_inner()),
                Err(e) => {
                    warn!(key = %key, error = %e, "Batch add failed for key");
                    result.failed.push(BatchFailure::new(&key, &e));
                }
            }
        }

        info!(
            added = result.added.len(),
            already_breached = result.already_breached.len(),
            invalid = result.invalid.len(),
            failed = result.failed.len(),
            "Batch add completed"
        );

        Ok(if self.config.sort_results {
            result.sorted()
        } else {
            result
        })
    }

    /// Clear every key passing `validator`
    #[instrument(skip(self, keys, validator), fields(count = keys.len()))]
    pub async fn remove_many<F>(&self, keys: &[String], validator: F) -> Result<RemoveResult>
    where
        F: Fn(&str) -> bool,
    {
        let prepared = self.prepare(keys, validator)?;
        let mut result = RemoveResult {
            invalid: prepared.invalid,
            ..Default::default()
        };

        for (key, outcome) in self.fan_out(prepared.keys, Operation::Remove).await {
            match outcome {
                Ok(_) => result.removed.push(key.into_inner()),
                Err(e) => {
                    warn!(key = %key, error = %e, "Batch remove failed for key");
                    result.failed.push(BatchFailure::new(&key, &e));
                }
            }
        }

        Ok(if self.config.sort_results {
            result.sorted()
        } else {
            result
        })
    }

    /// Look up every key passing `validator`
    #[instrument(skip(self, keys, validator), fields(count = keys.len()))]
    pub async fn check_many<F>(&self, keys: &[String], validator: F) -> Result<CheckResult>
    where
        F: Fn(&str) -> bool,
    {
        let prepared = self.prepare(keys, validator)?;
        let mut result = CheckResult {
            invalid: prepared.invalid,
            ..Default::default()
        };

        for (key, outcome) in self.fan_out(prepared.keys, Operation::IsBreached).await {
            match outcome {
                Ok(true) => result.breached.push(key.into_inner()),
                Ok(false) => result.not_breached.push(key.into_inner()),
                Err(e) => {
                    warn!(key = %key, error = %e, "Batch check failed for key");
                    result.failed.push(BatchFailure::new(&key, &e));
                }
            }
        }

        Ok(if self.config.sort_results {
            result.sorted()
        } else {
            result
        })
    }
}
