//! # Adapters
//!
//! Swappable implementations of port traits, plus the edges of the crate
//! that talk to the outside world:
//! - Storage adapters: Memory
//! - Snapshot state (serde)
//! - Python bindings (when enabled)
//!
//! Adapters can be swapped without changing the engine.

pub mod snapshot;
pub mod storage;

#[cfg(feature = "python")]
pub mod python;
