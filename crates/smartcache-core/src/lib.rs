//! SmartCache Core
//!
//! Core types, errors, and constants for the SmartCache per-key actor runtime.
//!
//! # Overview
//!
//! SmartCache tracks one boolean flag ("breached") per key. Each key is owned
//! by a single-writer actor that hydrates from a durable store on activation
//! and is evicted after an idle period.
//!
//! # TigerStyle
//!
//! This crate follows TigerStyle engineering principles:
//! - Explicit limits with big-endian naming (e.g., `ENTITY_KEY_LENGTH_BYTES_MAX`)
//! - Validation at construction
//! - No silent failure paths

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod key;
pub mod metrics;
pub mod telemetry;

pub use config::{
    ActorConfig, BatchConfig, ServerConfig, SmartCacheConfig, StorageBackend, StorageConfig,
};
pub use constants::*;
pub use error::{Error, Result};
pub use io::{TimeProvider, WallClockTime};
pub use key::{EntityKey, EntityState};
pub use telemetry::{init_telemetry, TelemetryConfig};
