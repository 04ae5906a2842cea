//! # Storage Adapters
//!
//! Implementations of the `SlotStore` port.
//!
//! Available adapters:
//! - `MemoryStorage` - In-memory HashMap (fast, volatile)

mod memory;

pub use memory::MemoryStorage;
