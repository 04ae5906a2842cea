//! # Python Bindings
//!
//! PyO3 bindings for mesh-memory, so planners written in Python can keep
//! their replay graph in Rust.
//!
//! ## Python API
//!
//! ```python
//! from mesh_memory import MeshMemory
//!
//! # 1000 slots of 32-dim latents, L2 kernel
//! mem = MeshMemory(n=1000, latent_dim=32, neighbor_r=0.035, kernel="l2")
//!
//! # Insert (evicts the densest slots when full)
//! spots = mem.add([[0.1] * 32, [0.2] * 32], payloads=[b"obs0", b"obs1"])
//!
//! # Query
//! for hit in mem.query([0.1] * 32, r=0.05):
//!     print(hit.slot, hit.distance)
//!
//! # Graph search bookkeeping
//! for n in mem.neighbors(spots[0]):
//!     mem.mark(spots[0], n)
//!
//! # Persistence
//! blob = mem.to_json()
//! restored = MeshMemory.from_json(blob, kernel="l2")
//! ```

use pyo3::exceptions::{PyIndexError, PyValueError};
use pyo3::prelude::*;

use crate::adapters::snapshot::MeshState;
use crate::core::config::MeshConfig;
use crate::core::kernel::{kernel_by_name, Kernel};
use crate::core::{Blob, Hit, Probe};
use crate::engine::{Entry, MeshMemory as RustMeshMemory};
use crate::ports::MeshError;

fn to_py_err(e: MeshError) -> PyErr {
    match e {
        MeshError::SlotOutOfRange { .. } | MeshError::EmptySlot(_) => PyIndexError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn kernel(name: &str) -> PyResult<Box<dyn Kernel>> {
    kernel_by_name(name).ok_or_else(|| {
        PyValueError::new_err(format!("Unknown kernel '{}', expected l2, dot or cos", name))
    })
}

/// Python wrapper for query results
#[pyclass(name = "Hit")]
#[derive(Clone)]
pub struct PyHit {
    #[pyo3(get)]
    pub slot: usize,

    #[pyo3(get)]
    pub distance: f32,
}

impl From<Hit> for PyHit {
    fn from(hit: Hit) -> Self {
        Self {
            slot: hit.slot,
            distance: hit.distance,
        }
    }
}

#[pymethods]
impl PyHit {
    fn __repr__(&self) -> String {
        format!("Hit(slot={}, distance={:.4})", self.slot, self.distance)
    }
}

/// Fixed-capacity latent memory with a proximity graph
///
/// First in, density out: new latents are always written; the slots in
/// the most crowded neighbourhoods are evicted to make room.
#[pyclass(name = "MeshMemory")]
pub struct PyMeshMemory {
    inner: RustMeshMemory,
}

#[pymethods]
impl PyMeshMemory {
    /// Args:
    ///     n: Number of slots
    ///     latent_dim: Latent dimension
    ///     neighbor_r: Edge radius
    ///     neighbor_r_min: Optional lower edge radius
    ///     enable_soft_prune: Keep pruned edges traversable within radius
    ///     kernel: "l2", "dot" or "cos"
    #[new]
    #[pyo3(signature = (n=100, latent_dim=10, neighbor_r=1.0, neighbor_r_min=None, enable_soft_prune=true, kernel="l2"))]
    fn new(
        n: usize,
        latent_dim: usize,
        neighbor_r: f32,
        neighbor_r_min: Option<f32>,
        enable_soft_prune: bool,
        kernel: &str,
    ) -> PyResult<Self> {
        let config = MeshConfig {
            capacity: n,
            latent_dim,
            neighbor_r,
            neighbor_r_min,
            enable_soft_prune,
        };
        let inner = RustMeshMemory::new(config, self::kernel(kernel)?).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Insert latents, optionally with payloads and coordinate metadata
    ///
    /// Returns:
    ///     List[int]: Slot used by each latent, in input order
    #[pyo3(signature = (latents, payloads=None, meta=None))]
    fn add(
        &mut self,
        latents: Vec<Vec<f32>>,
        payloads: Option<Vec<Vec<u8>>>,
        meta: Option<Vec<Vec<f32>>>,
    ) -> PyResult<Vec<usize>> {
        let n = latents.len();
        if payloads.as_ref().is_some_and(|p| p.len() != n) || meta.as_ref().is_some_and(|m| m.len() != n) {
            return Err(PyValueError::new_err("payloads and meta must match latents in length"));
        }

        let mut payloads = payloads.map(|p| p.into_iter());
        let mut meta = meta.map(|m| m.into_iter());
        let entries = latents
            .into_iter()
            .map(|latent| {
                let mut entry = Entry::latent(latent);
                if let Some(data) = payloads.as_mut().and_then(Iterator::next) {
                    entry = entry.with_payload(Blob::new(data));
                }
                if let Some(m) = meta.as_mut().and_then(Iterator::next) {
                    entry = entry.with_meta(m);
                }
                entry
            })
            .collect();

        self.inner.add(entries).map_err(to_py_err)
    }

    /// Occupied slots with r_min < distance < r, nearest first
    #[pyo3(signature = (latent, r=None, r_min=None))]
    fn query(&self, latent: Vec<f32>, r: Option<f32>, r_min: Option<f32>) -> PyResult<Vec<PyHit>> {
        let hits = self.inner.query(&latent, r, r_min).map_err(to_py_err)?;
        Ok(hits.into_iter().map(PyHit::from).collect())
    }

    /// Nearest slot to a latent, or None
    #[pyo3(signature = (latent, r=None, r_min=None))]
    fn localize(&self, latent: Vec<f32>, r: Option<f32>, r_min: Option<f32>) -> PyResult<Option<PyHit>> {
        let hit = self.inner.localize(&latent, r, r_min).map_err(to_py_err)?;
        Ok(hit.map(PyHit::from))
    }

    /// Nearest other slot to an occupied slot, or None
    #[pyo3(signature = (slot, r=None, r_min=None))]
    fn closest(&self, slot: usize, r: Option<f32>, r_min: Option<f32>) -> PyResult<Option<PyHit>> {
        let hit = self
            .inner
            .closest(Probe::Slot(slot), r, r_min)
            .map_err(to_py_err)?;
        Ok(hit.map(PyHit::from))
    }

    fn neighbors(&self, slot: usize) -> PyResult<Vec<usize>> {
        self.inner.neighbors(slot).map_err(to_py_err)
    }

    #[pyo3(signature = (i, j, dilate=None))]
    fn remove_edge(&mut self, i: usize, j: usize, dilate: Option<f32>) -> PyResult<()> {
        self.inner.remove_edge(i, j, dilate).map_err(to_py_err)
    }

    fn mark(&mut self, i: usize, j: usize) -> PyResult<()> {
        self.inner.mark(i, j).map_err(to_py_err)
    }

    fn reset_visited(&mut self) {
        self.inner.reset_visited();
    }

    #[pyo3(signature = (z, z_=None, *, r, add=false))]
    fn remove_similar(&mut self, z: Vec<f32>, z_: Option<Vec<f32>>, r: f32, add: bool) -> PyResult<Vec<usize>> {
        self.inner
            .remove_similar(&z, z_.as_deref(), r, add)
            .map_err(to_py_err)
    }

    #[pyo3(signature = (z, *, r))]
    fn remove_incoming(&mut self, z: Vec<f32>, r: f32) -> PyResult<Vec<usize>> {
        self.inner.remove_incoming(&z, r).map_err(to_py_err)
    }

    #[pyo3(signature = (z, z_goal, r, r0, d0=0.2))]
    fn remove_toward(
        &mut self,
        z: Vec<f32>,
        z_goal: Vec<f32>,
        r: f32,
        r0: f32,
        d0: f32,
    ) -> PyResult<Vec<(usize, usize)>> {
        self.inner
            .remove_toward(&z, &z_goal, r, r0, d0)
            .map_err(to_py_err)
    }

    /// Payloads of occupied slots as `(slot, bytes)` pairs
    fn payloads(&self) -> Vec<(usize, Vec<u8>)> {
        self.inner
            .payloads()
            .into_iter()
            .map(|(slot, blob)| (slot, blob.data().to_vec()))
            .collect()
    }

    fn remove_vertex(&mut self, slots: Vec<usize>) -> PyResult<()> {
        self.inner.remove_vertex(&slots).map_err(to_py_err)
    }

    fn remove_highest(&mut self, n: usize) -> Vec<usize> {
        self.inner.remove_highest(n)
    }

    fn pressure_release(&mut self, threshold: f32) -> Vec<usize> {
        self.inner.pressure_release(threshold)
    }

    fn sparsify(&mut self, r: f32) -> Vec<usize> {
        self.inner.sparsify(r)
    }

    #[pyo3(signature = (neighbor_r, neighbor_r_min=None))]
    fn update_r(&mut self, neighbor_r: f32, neighbor_r_min: Option<f32>) -> PyResult<()> {
        self.inner.update_r(neighbor_r, neighbor_r_min).map_err(to_py_err)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    /// Edges present, unvisited, and inside the band (defaults to the
    /// mesh radii)
    #[pyo3(signature = (r=None, r_min=None))]
    fn edges(&self, r: Option<f32>, r_min: Option<f32>) -> Vec<(usize, usize)> {
        self.inner.edges().traversable(r, r_min)
    }

    /// Structural edge count inside the band
    fn edge_count(&self) -> usize {
        self.inner.edges().len()
    }

    fn pruned_edges(&self) -> Vec<(usize, usize)> {
        self.inner.pruned_edges()
    }

    #[getter]
    fn nodes(&self) -> Vec<usize> {
        self.inner.nodes()
    }

    fn weight(&self, slot: usize) -> f32 {
        self.inner.weight(slot)
    }

    fn max_weight(&self) -> Option<f32> {
        self.inner.max_weight()
    }

    /// Multi-line graph report
    fn summary(&self) -> String {
        self.inner.summary().to_string()
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.state().to_json().map_err(to_py_err)
    }

    #[staticmethod]
    #[pyo3(signature = (json, kernel="l2"))]
    fn from_json(json: &str, kernel: &str) -> PyResult<Self> {
        let state = MeshState::from_json(json).map_err(to_py_err)?;
        let inner = RustMeshMemory::from_state(state, self::kernel(kernel)?).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// mesh-memory Python module
#[pymodule]
fn mesh_memory(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMeshMemory>()?;
    m.add_class::<PyHit>()?;

    m.add("__doc__", "mesh-memory: density-aware latent memory with a proximity graph")?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
