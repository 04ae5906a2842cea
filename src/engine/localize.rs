//! # Localization
//!
//! Temporarily place a probe (e.g. the agent's current observation) into the
//! mesh so graph search can start from it. The probe occupies a real slot,
//! so the guard removes it on drop, on every exit path.

use tracing::debug;

use super::mesh::{Entry, MeshMemory};
use crate::ports::{MeshError, MeshResult};

/// Scoped temporary slot. Dropping it removes the slot.
pub struct Localization<'a> {
    mesh: &'a mut MeshMemory,
    slot: usize,
    generation: u64,
}

impl MeshMemory {
    /// Insert `entry` into a temporary slot.
    ///
    /// When no slot is free, `suppressed` evicts the highest-weight slot to
    /// make room; otherwise the call fails rather than overwrite a vertex.
    pub fn localization(&mut self, entry: Entry, suppressed: bool) -> MeshResult<Localization<'_>> {
        let prepared = self.prepare(entry)?;

        if self.len() >= self.capacity() {
            if !suppressed {
                return Err(MeshError::CapacityExceeded {
                    requested: 1,
                    capacity: self.capacity(),
                });
            }
            self.remove_highest(1);
        }

        let spots = self.insert(vec![prepared]);
        let slot = spots[0];
        let generation = self.generations[slot];
        debug!(slot, generation, "Acquired localization slot");

        Ok(Localization {
            mesh: self,
            slot,
            generation,
        })
    }
}

impl<'a> Localization<'a> {
    /// Slot holding the probe
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn latent(&self) -> &[f32] {
        self.mesh.latent_slice(self.slot)
    }

    pub fn mesh(&self) -> &MeshMemory {
        &*self.mesh
    }

    /// Whether the probe still occupies its slot
    pub fn is_held(&self) -> bool {
        self.mesh.is_occupied(self.slot) && self.mesh.generations[self.slot] == self.generation
    }

    /// Mutable access for search bookkeeping (`mark`, `remove_edge`).
    ///
    /// If the probe slot is evicted and reused through this handle, the new
    /// occupant belongs to the caller and survives the drop.
    pub fn mesh_mut(&mut self) -> &mut MeshMemory {
        &mut *self.mesh
    }
}

impl Drop for Localization<'_> {
    fn drop(&mut self) {
        if self.is_held() {
            self.mesh.evict(&[self.slot]);
            debug!(slot = self.slot, "Released localization slot");
        } else {
            debug!(slot = self.slot, "Localization slot already released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MeshConfig;
    use crate::core::Blob;

    fn mesh() -> MeshMemory {
        let mut mesh = MeshMemory::euclidean(MeshConfig::new(4, 1).with_neighbor_r(1.0)).unwrap();
        mesh.add_latents(vec![vec![0.0], vec![0.5], vec![3.0]]).unwrap();
        mesh
    }

    #[test]
    fn test_localization_is_released() {
        let mut mesh = mesh();

        {
            let guard = mesh
                .localization(Entry::latent(vec![0.4]).with_payload(Blob::from_str("obs")), false)
                .unwrap();
            assert_eq!(guard.slot(), 3);
            assert_eq!(guard.latent(), &[0.4]);
            assert_eq!(guard.mesh().len(), 4);
            assert_eq!(guard.mesh().neighbors(3).unwrap(), vec![1, 0]);
        }

        assert_eq!(mesh.len(), 3);
        assert!(!mesh.is_occupied(3));
        assert!(mesh.payload(3).is_none());
        assert!((mesh.weight(1) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_localization_released_on_early_return() {
        fn search(mesh: &mut MeshMemory) -> MeshResult<usize> {
            let guard = mesh.localization(Entry::latent(vec![2.9]), false)?;
            let start = guard.slot();
            guard.mesh().neighbors(start)?;
            Err(MeshError::EmptySlot(start))
        }

        let mut mesh = mesh();
        assert!(search(&mut mesh).is_err());
        assert_eq!(mesh.len(), 3);
    }

    #[test]
    fn test_localization_full_not_suppressed() {
        let mut mesh = mesh();
        mesh.add_latents(vec![vec![9.0]]).unwrap();

        let result = mesh.localization(Entry::latent(vec![0.1]), false);
        assert!(matches!(result, Err(MeshError::CapacityExceeded { .. })));
        drop(result);

        assert_eq!(mesh.len(), 4);
    }

    #[test]
    fn test_localization_full_suppressed_evicts() {
        let mut mesh = mesh();
        mesh.add_latents(vec![vec![9.0]]).unwrap();

        {
            let mut guard = mesh.localization(Entry::latent(vec![8.9]), true).unwrap();
            let slot = guard.slot();
            assert_eq!(guard.mesh().len(), 4);
            guard.mesh_mut().mark(slot, 3).unwrap();
        }

        assert_eq!(mesh.len(), 3);
        assert!(mesh.is_occupied(3));
    }

    #[test]
    fn test_localization_bad_dims_evicts_nothing() {
        let mut mesh = mesh();
        mesh.add_latents(vec![vec![9.0]]).unwrap();

        let result = mesh.localization(Entry::latent(vec![0.1, 0.2]), true);
        assert!(matches!(result, Err(MeshError::DimensionalityMismatch { .. })));
        drop(result);

        assert_eq!(mesh.len(), 4);
    }

    #[test]
    fn test_localization_spares_recycled_slot() {
        let mut mesh = MeshMemory::euclidean(MeshConfig::new(2, 1)).unwrap();
        mesh.add_latents(vec![vec![0.0]]).unwrap();

        {
            let mut guard = mesh.localization(Entry::latent(vec![5.0]), false).unwrap();
            let slot = guard.slot();
            assert_eq!(slot, 1);
            assert!(guard.is_held());

            guard.mesh_mut().remove_vertex(&[slot]).unwrap();
            let reused = guard.mesh_mut().add_latents(vec![vec![7.0]]).unwrap();
            assert_eq!(reused, vec![1]);
            assert!(!guard.is_held());
        }

        assert!(mesh.is_occupied(1));
        assert_eq!(mesh.latent(1), Some(&[7.0][..]));
        assert_eq!(mesh.len(), 2);
    }
}
