//! SmartCache DST - Deterministic Simulation Testing
//!
//! # Overview
//!
//! Simulation tests drive the real runtime against:
//! - A manually advanced clock (SimClock / SimTime)
//! - Reproducible random numbers (DeterministicRng)
//! - Storage fault injection (FaultInjector / SimStore)
//!
//! # Example
//!
//! ```rust,ignore
//! use smartcache_dst::{FaultConfig, FaultType, SimConfig, Simulation};
//!
//! #[test]
//! fn test_with_faults() {
//!     let config = SimConfig::from_env_or_random();
//!     Simulation::new(config)
//!         .with_fault(FaultConfig::new(FaultType::StorageWriteFail, 0.1))
//!         .run(|env| async move {
//!             let runtime = env.runtime()?;
//!             Ok(())
//!         })
//!         .unwrap();
//! }
//! ```
//!
//! # TigerStyle
//!
//! - All operations are deterministic given the same seed
//! - Always log the seed for reproducibility
//! - Explicit fault types and probabilities

pub mod clock;
pub mod fault;
pub mod rng;
pub mod simulation;
pub mod store;
pub mod time;

pub use clock::SimClock;
pub use fault::{FaultConfig, FaultInjector, FaultInjectorBuilder, FaultStats, FaultType};
pub use rng::DeterministicRng;
pub use simulation::{SimConfig, SimEnvironment, Simulation, SimulationError};
pub use store::SimStore;
pub use time::SimTime;
