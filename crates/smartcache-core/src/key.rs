//! Entity keys and durable entity records
//!
//! TigerStyle: Keys are validated on construction and immutable afterwards.

use crate::constants::ENTITY_KEY_LENGTH_BYTES_MAX;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of one tracked entity
///
/// Case-sensitive and opaque to the runtime. The runtime only requires the
/// key to be non-empty and bounded; syntax rules (e.g. email format) belong
/// to the caller.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    /// Create a new key with validation
    ///
    /// # Errors
    /// Returns error if the key is empty, all whitespace, or exceeds
    /// `ENTITY_KEY_LENGTH_BYTES_MAX`.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();

        if key.trim().is_empty() {
            return Err(Error::invalid_key(key, "key must not be empty"));
        }

        if key.len() > ENTITY_KEY_LENGTH_BYTES_MAX {
            return Err(Error::KeyTooLong {
                length: key.len(),
                limit: ENTITY_KEY_LENGTH_BYTES_MAX,
            });
        }

        Ok(Self(key))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for EntityKey {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for EntityKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

/// Durable record for one key
///
/// A record exists in the store only while the key is breached. An absent
/// record reads as `breached = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    pub key: EntityKey,
    pub breached: bool,
}

impl EntityState {
    /// Record marking `key` as breached
    pub fn breached(key: EntityKey) -> Self {
        Self {
            key,
            breached: true,
        }
    }

    /// Serialize to the JSON wire form used by every store backend
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::SerializationFailed {
            reason: format!("entity state for {}: {}", self.key, e),
        })
    }

    /// Parse the JSON wire form
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::DeserializationFailed {
            reason: format!("entity state: {}", e),
        })
    }
}
