//! # Snapshot
//!
//! Plain-data state of a mesh, for saving and restoring outside the process.
//!
//! ## Format
//!
//! ```text
//! MeshState
//! ├── config: MeshConfig
//! ├── latents: Vec<f32>            (capacity * latent_dim, row-major)
//! ├── slots: Vec<SlotState>        (occupancy + weight)
//! ├── distances: Vec<(i, j, d)>    (finite upper-triangle entries only)
//! ├── edge_mask: Vec<bool>         (capacity², row-major)
//! ├── visited_mask: Vec<bool>      (capacity², row-major)
//! └── records: Vec<SlotRecord>     (payload + meta per slot that has any)
//! ```
//!
//! The distance matrix is symmetric with an infinite diagonal, so only the
//! finite upper triangle is stored. Kernels and embedders are code, not
//! data; the caller supplies them again on restore.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::MeshConfig;
use crate::core::kernel::Kernel;
use crate::core::matrix::SquareMatrix;
use crate::core::{Blob, SlotState};
use crate::engine::MeshMemory;
use crate::ports::{MeshError, MeshResult};

/// One stored distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceEntry {
    pub i: usize,
    pub j: usize,
    pub d: f32,
}

/// Payload and metadata of one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub slot: usize,
    pub payload: Option<Blob>,
    pub meta: Option<Vec<f32>>,
}

/// Serializable mesh state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshState {
    pub config: MeshConfig,
    pub latents: Vec<f32>,
    pub slots: Vec<SlotState>,
    pub distances: Vec<DistanceEntry>,
    pub edge_mask: Vec<bool>,
    pub visited_mask: Vec<bool>,
    pub records: Vec<SlotRecord>,
}

impl MeshState {
    pub fn to_json(&self) -> MeshResult<String> {
        serde_json::to_string(self).map_err(|e| MeshError::Snapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> MeshResult<Self> {
        serde_json::from_str(json).map_err(|e| MeshError::Snapshot(e.to_string()))
    }

    fn check_len(what: &str, got: usize, expected: usize) -> MeshResult<()> {
        if got != expected {
            return Err(MeshError::Snapshot(format!(
                "{} has length {}, expected {}",
                what, got, expected
            )));
        }
        Ok(())
    }
}

impl MeshMemory {
    /// Capture the full state
    pub fn state(&self) -> MeshState {
        let n = self.capacity();

        let mut distances = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.pairwise.get(i, j);
                if d.is_finite() {
                    distances.push(DistanceEntry { i, j, d });
                }
            }
        }

        let records = (0..n)
            .filter_map(|slot| {
                let payload = self.storage.payload(slot).cloned();
                let meta = self.storage.meta(slot).map(<[f32]>::to_vec);
                (payload.is_some() || meta.is_some()).then_some(SlotRecord { slot, payload, meta })
            })
            .collect();

        MeshState {
            config: self.config.clone(),
            latents: self.latents.clone(),
            slots: self.slots.clone(),
            distances,
            edge_mask: self.edge_mask.as_flat().to_vec(),
            visited_mask: self.visited_mask.as_flat().to_vec(),
            records,
        }
    }

    /// Rebuild a mesh from a captured state.
    ///
    /// Every length and index is validated first. Payloads land in a fresh
    /// `MemoryStorage`.
    pub fn from_state(state: MeshState, kernel: Box<dyn Kernel>) -> MeshResult<Self> {
        let MeshState {
            config,
            latents,
            slots,
            distances,
            edge_mask,
            visited_mask,
            records,
        } = state;

        config.validate()?;

        let n = config.capacity;
        MeshState::check_len("slots", slots.len(), n)?;
        MeshState::check_len("latents", latents.len(), n * config.latent_dim)?;

        let edge_mask = SquareMatrix::from_flat(n, edge_mask)
            .ok_or_else(|| MeshError::Snapshot(format!("edge_mask is not {}x{}", n, n)))?;
        let visited_mask = SquareMatrix::from_flat(n, visited_mask)
            .ok_or_else(|| MeshError::Snapshot(format!("visited_mask is not {}x{}", n, n)))?;

        for entry in &distances {
            if entry.i >= n || entry.j >= n || entry.i == entry.j {
                return Err(MeshError::Snapshot(format!(
                    "distance entry ({}, {}) invalid for capacity {}",
                    entry.i, entry.j, n
                )));
            }
        }
        if let Some(bad) = records.iter().find(|r| r.slot >= n) {
            return Err(MeshError::Snapshot(format!(
                "record for slot {} out of range for capacity {}",
                bad.slot, n
            )));
        }

        let mut mesh = MeshMemory::new(config, kernel)?;
        mesh.latents = latents;
        mesh.slots = slots;
        mesh.edge_mask = edge_mask;
        mesh.visited_mask = visited_mask;
        for DistanceEntry { i, j, d } in distances {
            mesh.pairwise.set_symmetric(i, j, d);
        }
        for SlotRecord { slot, payload, meta } in records {
            mesh.storage.put(slot, payload, meta);
        }

        info!(capacity = n, len = mesh.len(), "Restored mesh memory from snapshot");
        Ok(mesh)
    }
}
