//! # Mesh Memory
//!
//! > First in, density out.
//!
//! A fixed-capacity memory of latent vectors with an evolving proximity
//! graph. New latents are always written; when the memory is full, the slots
//! sitting in the most crowded neighbourhoods are evicted. Built for
//! incremental memory management in search and reinforcement learning, where
//! a planner walks the graph between remembered states.
//!
//! ## Philosophy
//!
//! - **Density is redundancy** - a slot's weight is the sum of inverse
//!   distances to its neighbours; the heaviest slot goes first
//! - **Structure is not history** - edge existence and traversal state are
//!   separate masks
//! - **Bounded by construction** - all storage is allocated up front
//! - **Pure core, swappable adapters** - Hexagonal architecture
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MESH MEMORY                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  CORE (pure math, no I/O)                                   │
//! │    Blob, SlotState, Hit, Kernel, MeshConfig, SquareMatrix   │
//! │                                                              │
//! │  PORTS (trait contracts)                                     │
//! │    SlotStore, Embed, MeshError                              │
//! │                                                              │
//! │  ADAPTERS (swappable implementations)                       │
//! │    Storage: Memory                                          │
//! │    Snapshot: serde state                                    │
//! │    API: Python bindings                                      │
//! │                                                              │
//! │  ENGINE (orchestration)                                      │
//! │    MeshMemory, EdgeView, GraphSummary, Localization         │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use mesh_memory::{MeshConfig, MeshMemory};
//!
//! let config = MeshConfig::new(4, 2).with_neighbor_r(1.0);
//! let mut mesh = MeshMemory::euclidean(config).unwrap();
//!
//! let spots = mesh
//!     .add_latents(vec![vec![0.0, 0.0], vec![0.1, 0.0], vec![5.0, 5.0]])
//!     .unwrap();
//! assert_eq!(spots, vec![0, 1, 2]);
//!
//! // Walk the graph
//! assert_eq!(mesh.neighbors(0).unwrap(), vec![1]);
//! assert_eq!(mesh.edges().len(), 2);
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// Core domain - pure math, no I/O
/// Contains: Blob, SlotState, Hit, kernels, config, matrix
pub mod core;

/// Port definitions - trait contracts for adapters
/// Contains: SlotStore, Embed, MeshError
pub mod ports;

/// Adapter implementations - swappable components
/// Contains: storage, snapshot, python submodules
pub mod adapters;

/// Engine - orchestration layer
/// Contains: MeshMemory and its views
pub mod engine;

// ============================================================================
// PYTHON BINDINGS (when enabled)
// ============================================================================

#[cfg(feature = "python")]
pub use adapters::python::*;

// ============================================================================
// RE-EXPORTS (public API)
// ============================================================================

// Core types
pub use crate::core::config::MeshConfig;
pub use crate::core::kernel::{kernel_by_name, Cosine, DotProduct, Euclidean, FnKernel, Kernel};
pub use crate::core::{Blob, Hit, Probe, SlotState};

// Ports
pub use crate::ports::{Embed, FnEmbed, MeshError, MeshResult, SlotStore};

// Adapters
pub use crate::adapters::snapshot::MeshState;
pub use crate::adapters::storage::MemoryStorage;

// Engine
pub use crate::engine::{EdgeAttrs, EdgeView, Entry, GraphSummary, Localization, MeshMemory};
