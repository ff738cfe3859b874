//! SmartCache Runtime
//!
//! Per-key single-writer actors for the breached flag.
//!
//! # Overview
//!
//! The runtime provides:
//! - One actor task per active key, serializing that key's operations
//! - On-demand activation with hydration from the state store
//! - Idle eviction on a fixed quantum
//! - Batch fan-out with per-key failure isolation
//!
//! # TigerStyle
//! - Single activation guarantee (one actor per key)
//! - Explicit lifecycle states
//! - Bounded mailboxes (no silent message drops)

pub mod activation;
pub mod batch;
pub mod directory;
pub mod handle;
pub mod mailbox;
pub mod runtime;
pub mod sweeper;

#[cfg(test)]
mod test_support;

pub use activation::{ActivationState, ActivationStats, KeyActor};
pub use batch::{BatchCoordinator, BatchFailure, BatchResult, CheckResult, RemoveResult};
pub use directory::{ActorDirectory, DirectoryStats};
pub use handle::ActorHandle;
pub use mailbox::{Envelope, Operation};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use sweeper::IdleSweepTask;
