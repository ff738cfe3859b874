//! TigerStyle constants for SmartCache
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Key Limits
// =============================================================================

/// Maximum length of an entity key in bytes (RFC 5321 address bound)
pub const ENTITY_KEY_LENGTH_BYTES_MAX: usize = 320;

// =============================================================================
// Actor Lifecycle
// =============================================================================

/// Default period between idle sweeps in milliseconds (1 min)
pub const ACTOR_COLLECTION_QUANTUM_MS_DEFAULT: u64 = 60 * 1000;

/// Minimum period between idle sweeps in milliseconds
pub const ACTOR_COLLECTION_QUANTUM_MS_MIN: u64 = 10;

/// Default idle age before an actor is evicted in milliseconds (5 min)
pub const ACTOR_COLLECTION_AGE_MS_DEFAULT: u64 = 5 * 60 * 1000;

/// Maximum idle age before an actor is evicted in milliseconds (24 hours)
pub const ACTOR_COLLECTION_AGE_MS_MAX: u64 = 24 * 60 * 60 * 1000;

/// Default depth of a per-key mailbox
pub const MAILBOX_DEPTH_DEFAULT: usize = 1000;

/// Maximum depth of a per-key mailbox
pub const MAILBOX_DEPTH_MAX: usize = 10_000;

/// Default number of directory shards
pub const DIRECTORY_SHARDS_COUNT_DEFAULT: usize = 64;

/// Maximum number of directory shards
pub const DIRECTORY_SHARDS_COUNT_MAX: usize = 4096;

// =============================================================================
// Storage
// =============================================================================

/// Default timeout for a single durable store call in milliseconds (2 sec)
pub const STORAGE_TIMEOUT_MS_DEFAULT: u64 = 2 * 1000;

/// Maximum timeout for a single durable store call in milliseconds (30 sec)
pub const STORAGE_TIMEOUT_MS_MAX: u64 = 30 * 1000;

// =============================================================================
// Batch Limits
// =============================================================================

/// Default number of keys dispatched concurrently by one batch
pub const BATCH_CONCURRENCY_COUNT_DEFAULT: usize = 256;

/// Maximum number of keys dispatched concurrently by one batch
pub const BATCH_CONCURRENCY_COUNT_MAX: usize = 10_000;

/// Default number of keys accepted in one batch
pub const BATCH_KEYS_COUNT_DEFAULT: usize = 10_000;

/// Maximum number of keys accepted in one batch
pub const BATCH_KEYS_COUNT_MAX: usize = 100_000;

// =============================================================================
// Observability - Metric Names (TigerStyle: explicit, with units)
// =============================================================================

/// Metric: Total number of actor activations (counter)
pub const METRIC_NAME_ACTORS_ACTIVATED_TOTAL: &str = "smartcache_actors_activated_total";

/// Metric: Total number of actor deactivations (counter)
pub const METRIC_NAME_ACTORS_DEACTIVATED_TOTAL: &str = "smartcache_actors_deactivated_total";

/// Metric: Total number of operations (counter, labels: operation, status)
pub const METRIC_NAME_OPERATIONS_TOTAL: &str = "smartcache_operations_total";

/// Metric: Operation duration in seconds (histogram)
pub const METRIC_NAME_OPERATION_DURATION_SECONDS: &str = "smartcache_operation_duration_seconds";

/// Metric: Total store operations (counter, labels: operation, status)
pub const METRIC_NAME_STORE_OPERATIONS_TOTAL: &str = "smartcache_store_operations_total";

/// Metric: Store operation duration in seconds (histogram, labels: operation)
pub const METRIC_NAME_STORE_DURATION_SECONDS: &str = "smartcache_store_duration_seconds";

// Compile-time assertions for constant validity
const _: () = {
    assert!(ENTITY_KEY_LENGTH_BYTES_MAX >= 254);
    assert!(ACTOR_COLLECTION_AGE_MS_DEFAULT > ACTOR_COLLECTION_QUANTUM_MS_DEFAULT);
    assert!(ACTOR_COLLECTION_AGE_MS_DEFAULT <= ACTOR_COLLECTION_AGE_MS_MAX);
    assert!(MAILBOX_DEPTH_DEFAULT <= MAILBOX_DEPTH_MAX);
    assert!(STORAGE_TIMEOUT_MS_DEFAULT <= STORAGE_TIMEOUT_MS_MAX);
    assert!(BATCH_CONCURRENCY_COUNT_DEFAULT <= BATCH_CONCURRENCY_COUNT_MAX);
    assert!(BATCH_KEYS_COUNT_DEFAULT <= BATCH_KEYS_COUNT_MAX);
    assert!(DIRECTORY_SHARDS_COUNT_DEFAULT <= DIRECTORY_SHARDS_COUNT_MAX);
};
