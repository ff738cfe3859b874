//! SmartCache Storage
//!
//! Durable entity state stores for SmartCache actors.
//!
//! # Overview
//!
//! Every backend implements [`StateStore`] (read / write / clear of one
//! [`EntityState`](smartcache_core::EntityState) per key):
//! - In-memory (for testing and DST)
//! - File-backed (one JSON file per key)

pub mod file;
pub mod memory;
pub mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::StateStore;
