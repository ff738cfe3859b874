//! Configuration for SmartCache
//!
//! TigerStyle: Explicit defaults, validation, reasonable limits.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for SmartCache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmartCacheConfig {
    /// Actor lifecycle configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// Batch coordinator configuration
    #[serde(default)]
    pub batch: BatchConfig,

    /// Durable store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl SmartCacheConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::InvalidConfiguration {
            field: "<document>".into(),
            reason: e.to_string(),
        })
    }

    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::InvalidConfiguration {
            field: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_yaml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.actor.validate()?;
        self.batch.validate()?;
        self.storage.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

/// Actor lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Period between idle sweeps (milliseconds)
    #[serde(default = "default_collection_quantum_ms")]
    pub collection_quantum_ms: u64,

    /// Idle age after which an actor is evicted (milliseconds)
    #[serde(default = "default_collection_age_ms")]
    pub collection_age_ms: u64,

    /// Maximum queued operations per key
    #[serde(default = "default_mailbox_depth")]
    pub mailbox_depth_max: usize,

    /// Timeout applied to each durable store call (milliseconds)
    #[serde(default = "default_storage_timeout_ms")]
    pub storage_timeout_ms: u64,

    /// Number of independently locked directory shards
    #[serde(default = "default_directory_shards")]
    pub directory_shards_count: usize,
}

fn default_collection_quantum_ms() -> u64 {
    ACTOR_COLLECTION_QUANTUM_MS_DEFAULT
}

fn default_collection_age_ms() -> u64 {
    ACTOR_COLLECTION_AGE_MS_DEFAULT
}

fn default_mailbox_depth() -> usize {
    MAILBOX_DEPTH_DEFAULT
}

fn default_storage_timeout_ms() -> u64 {
    STORAGE_TIMEOUT_MS_DEFAULT
}

fn default_directory_shards() -> usize {
    DIRECTORY_SHARDS_COUNT_DEFAULT
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            collection_quantum_ms: default_collection_quantum_ms(),
            collection_age_ms: default_collection_age_ms(),
            mailbox_depth_max: default_mailbox_depth(),
            storage_timeout_ms: default_storage_timeout_ms(),
            directory_shards_count: default_directory_shards(),
        }
    }
}

impl ActorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.collection_quantum_ms < ACTOR_COLLECTION_QUANTUM_MS_MIN {
            return Err(Error::InvalidConfiguration {
                field: "actor.collection_quantum_ms".into(),
                reason: format!(
                    "{} is below minimum {}",
                    self.collection_quantum_ms, ACTOR_COLLECTION_QUANTUM_MS_MIN
                ),
            });
        }

        if self.collection_age_ms > ACTOR_COLLECTION_AGE_MS_MAX {
            return Err(Error::InvalidConfiguration {
                field: "actor.collection_age_ms".into(),
                reason: format!(
                    "{} exceeds limit {}",
                    self.collection_age_ms, ACTOR_COLLECTION_AGE_MS_MAX
                ),
            });
        }

        if self.mailbox_depth_max == 0 || self.mailbox_depth_max > MAILBOX_DEPTH_MAX {
            return Err(Error::InvalidConfiguration {
                field: "actor.mailbox_depth_max".into(),
                reason: format!("must be in 1..={}", MAILBOX_DEPTH_MAX),
            });
        }

        if self.storage_timeout_ms == 0 || self.storage_timeout_ms > STORAGE_TIMEOUT_MS_MAX {
            return Err(Error::InvalidConfiguration {
                field: "actor.storage_timeout_ms".into(),
                reason: format!("must be in 1..={}", STORAGE_TIMEOUT_MS_MAX),
            });
        }

        if self.directory_shards_count == 0
            || self.directory_shards_count > DIRECTORY_SHARDS_COUNT_MAX
        {
            return Err(Error::InvalidConfiguration {
                field: "actor.directory_shards_count".into(),
                reason: format!("must be in 1..={}", DIRECTORY_SHARDS_COUNT_MAX),
            });
        }

        Ok(())
    }
}

/// Batch coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Keys dispatched concurrently per batch
    #[serde(default = "default_batch_concurrency")]
    pub concurrency_max: usize,

    /// Keys accepted in a single batch
    #[serde(default = "default_batch_keys")]
    pub keys_count_max: usize,

    /// Sort each result partition by key
    #[serde(default)]
    pub sort_results: bool,
}

fn default_batch_concurrency() -> usize {
    BATCH_CONCURRENCY_COUNT_DEFAULT
}

fn default_batch_keys() -> usize {
    BATCH_KEYS_COUNT_DEFAULT
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency_max: default_batch_concurrency(),
            keys_count_max: default_batch_keys(),
            sort_results: false,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency_max == 0 || self.concurrency_max > BATCH_CONCURRENCY_COUNT_MAX {
            return Err(Error::InvalidConfiguration {
                field: "batch.concurrency_max".into(),
                reason: format!("must be in 1..={}", BATCH_CONCURRENCY_COUNT_MAX),
            });
        }

        if self.keys_count_max == 0 || self.keys_count_max > BATCH_KEYS_COUNT_MAX {
            return Err(Error::InvalidConfiguration {
                field: "batch.keys_count_max".into(),
                reason: format!("must be in 1..={}", BATCH_KEYS_COUNT_MAX),
            });
        }

        Ok(())
    }
}

/// Durable store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory holding one record file per key (file backend)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Storage backend type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// One JSON file per key on local disk
    File,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::File && self.data_dir.is_none() {
            return Err(Error::InvalidConfiguration {
                field: "storage.data_dir".into(),
                reason: "required when backend is file".into(),
            });
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// API key required in the `X-API-Key` header (None disables auth)
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.bind_address.contains(':') {
            return Err(Error::InvalidConfiguration {
                field: "server.bind_address".into(),
                reason: "must be in host:port format".into(),
            });
        }
        if matches!(&self.api_key, Some(key) if key.is_empty()) {
            return Err(Error::InvalidConfiguration {
                field: "server.api_key".into(),
                reason: "must not be empty when set".into(),
            });
        }
        Ok(())
    }
}
