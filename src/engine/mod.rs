//! # Engine
//!
//! The mesh itself and the read-side views built on it.
//!
//! This is where:
//! - Slots are filled and evicted by density
//! - The proximity graph is maintained
//! - Edges are exposed to graph search consumers

mod edges;
mod localize;
mod mesh;
mod summary;

pub use edges::{EdgeAttrs, EdgeView};
pub use localize::Localization;
pub use mesh::{compute_weight, Entry, MeshMemory, MIN_DISTANCE};
pub use summary::GraphSummary;
