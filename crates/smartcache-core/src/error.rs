//! Error types for SmartCache
//!
//! TigerStyle: Explicit error types with context, using thiserror.

use thiserror::Error;

/// Result type alias for SmartCache operations
pub type Result<T> = std::result::Result<T, Error>;

/// SmartCache error types
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Key / Validation Errors
    // =========================================================================
    #[error("Invalid key: {key}, reason: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Key too long: {length} bytes exceeds limit of {limit} bytes")]
    KeyTooLong { length: usize, limit: usize },

    #[error("Validation failed: {value}, reason: {reason}")]
    ValidationFailed { value: String, reason: String },

    #[error("Batch too large: {count} keys exceeds limit of {limit} keys")]
    BatchTooLarge { count: usize, limit: usize },

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    #[error("Storage read failed: {key}, reason: {reason}")]
    StorageReadFailed { key: String, reason: String },

    #[error("Storage write failed: {key}, reason: {reason}")]
    StorageWriteFailed { key: String, reason: String },

    #[error("Storage clear failed: {key}, reason: {reason}")]
    StorageClearFailed { key: String, reason: String },

    #[error("Storage timeout: {key}, operation: {operation}, after {timeout_ms}ms")]
    StorageTimeout {
        key: String,
        operation: String,
        timeout_ms: u64,
    },

    // =========================================================================
    // Actor Errors
    // =========================================================================
    #[error("Actor activation failed: {key}, reason: {reason}")]
    ActorActivationFailed { key: String, reason: String },

    #[error("Actor mailbox full: {key}, depth: {depth}, max: {max}")]
    ActorMailboxFull {
        key: String,
        depth: usize,
        max: usize,
    },

    #[error("Operation timed out: {operation} on {key} after {timeout_ms}ms")]
    OperationTimedOut {
        key: String,
        operation: String,
        timeout_ms: u64,
    },

    #[error("Runtime is shut down")]
    RuntimeShutdown,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {field}, reason: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {reason}")]
    Internal { reason: String },

    #[error("Serialization failed: {reason}")]
    SerializationFailed { reason: String },

    #[error("Deserialization failed: {reason}")]
    DeserializationFailed { reason: String },
}

impl Error {
    /// Create an invalid key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage read failed error
    pub fn storage_read_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StorageReadFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage write failed error
    pub fn storage_write_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StorageWriteFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage clear failed error
    pub fn storage_clear_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StorageClearFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage timeout error
    pub fn storage_timeout(
        key: impl Into<String>,
        operation: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self::StorageTimeout {
            key: key.into(),
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Durable store failed or did not answer in time
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::StorageReadFailed { .. }
                | Self::StorageWriteFailed { .. }
                | Self::StorageClearFailed { .. }
                | Self::StorageTimeout { .. }
        )
    }

    /// Input was rejected before reaching an actor
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. }
                | Self::KeyTooLong { .. }
                | Self::ValidationFailed { .. }
                | Self::BatchTooLarge { .. }
        )
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        self.is_persistence()
            || matches!(
                self,
                Self::ActorMailboxFull { .. } | Self::OperationTimedOut { .. }
            )
    }
}
