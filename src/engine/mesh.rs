//! # Mesh Memory
//!
//! First in, density out.
//!
//! New latents are always written. Room is made by evicting the slots that
//! sit in the most crowded neighbourhoods, measured by a weight that sums
//! inverse distances to every neighbour inside `neighbor_r`. Alongside the
//! latents the mesh keeps a dense distance matrix plus two masks:
//!
//! - `edge_mask` - structural existence of an edge, cleared by pruning
//! - `visited_mask` - traversal consumption, cleared by `mark`
//!
//! Both masks are stored unfiltered. The radius band is applied at read time.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, trace, warn};

use super::edges::{within_band, EdgeView};
use super::summary::GraphSummary;
use crate::adapters::storage::MemoryStorage;
use crate::core::config::{check_radius, MeshConfig};
use crate::core::kernel::{Euclidean, Kernel};
use crate::core::matrix::SquareMatrix;
use crate::core::{Blob, Hit, Probe, SlotState};
use crate::ports::{Embed, MeshError, MeshResult, SlotStore};

/// Distances below this are clamped before inversion, so exact duplicates
/// get a very large but finite weight.
pub const MIN_DISTANCE: f32 = 1e-6;

/// One item to insert.
///
/// Needs a latent, or a payload plus an embedder on the mesh.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub latent: Option<Vec<f32>>,
    pub payload: Option<Blob>,
    pub meta: Option<Vec<f32>>,
}

impl Entry {
    pub fn latent(latent: Vec<f32>) -> Self {
        Self {
            latent: Some(latent),
            ..Default::default()
        }
    }

    /// Entry whose latent will be produced by the mesh's embedder
    pub fn payload(payload: Blob) -> Self {
        Self {
            payload: Some(payload),
            ..Default::default()
        }
    }

    pub fn with_payload(mut self, payload: Blob) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach coordinate metadata (e.g. the ground-truth position)
    pub fn with_meta(mut self, meta: Vec<f32>) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// An entry whose latent has been resolved and checked
pub(crate) struct Prepared {
    latent: Vec<f32>,
    payload: Option<Blob>,
    meta: Option<Vec<f32>>,
}

/// Sum of inverse distances to every neighbour strictly inside `neighbor_r`.
///
/// NaN, infinite and negative distances never contribute. Similarity
/// kernels such as `DotProduct` can score below zero; those pairs still
/// count for queries and edges but carry no eviction weight.
pub fn compute_weight(row: &[f32], neighbor_r: f32) -> f32 {
    row.iter()
        .filter(|d| **d >= 0.0 && **d < neighbor_r)
        .map(|d| 1.0 / d.max(MIN_DISTANCE))
        .sum()
}

/// Fixed-capacity latent memory with a proximity graph
pub struct MeshMemory {
    pub(crate) config: MeshConfig,
    pub(crate) kernel: Box<dyn Kernel>,
    pub(crate) embedder: Option<Box<dyn Embed>>,
    pub(crate) storage: Box<dyn SlotStore>,

    /// Flat `capacity * latent_dim` latent storage
    pub(crate) latents: Vec<f32>,
    pub(crate) slots: Vec<SlotState>,
    pub(crate) pairwise: SquareMatrix<f32>,
    pub(crate) edge_mask: SquareMatrix<bool>,
    pub(crate) visited_mask: SquareMatrix<bool>,

    /// Per-slot write counter, bumped every time a slot is (re)occupied
    pub(crate) generations: Vec<u64>,
}

impl MeshMemory {
    /// Create a mesh with the given kernel and in-memory payload storage
    pub fn new(config: MeshConfig, kernel: Box<dyn Kernel>) -> MeshResult<Self> {
        config.validate()?;

        let n = config.capacity;

        info!(
            capacity = n,
            latent_dim = config.latent_dim,
            neighbor_r = config.neighbor_r,
            kernel = kernel.name(),
            "Creating mesh memory"
        );

        Ok(Self {
            latents: vec![0.0; n * config.latent_dim],
            slots: vec![SlotState::Empty; n],
            pairwise: SquareMatrix::filled(n, f32::INFINITY),
            edge_mask: SquareMatrix::filled(n, true),
            visited_mask: SquareMatrix::filled(n, true),
            generations: vec![0; n],
            storage: Box::new(MemoryStorage::new()),
            embedder: None,
            kernel,
            config,
        })
    }

    /// Create a mesh with the default Euclidean kernel
    pub fn euclidean(config: MeshConfig) -> MeshResult<Self> {
        Self::new(config, Box::new(Euclidean))
    }

    /// Attach an embedder for payload-only entries
    pub fn with_embedder(mut self, embedder: Box<dyn Embed>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Swap the payload storage backend. Existing payloads are not migrated.
    pub fn with_storage(mut self, storage: Box<dyn SlotStore>) -> Self {
        self.storage = storage;
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn kernel(&self) -> &dyn Kernel {
        self.kernel.as_ref()
    }

    /// Total number of slots, N
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn latent_dim(&self) -> usize {
        self.config.latent_dim
    }

    pub fn neighbor_r(&self) -> f32 {
        self.config.neighbor_r
    }

    pub fn neighbor_r_min(&self) -> Option<f32> {
        self.config.neighbor_r_min
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices of occupied slots, ascending
    pub fn nodes(&self) -> Vec<usize> {
        self.occupied().collect()
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(SlotState::is_occupied)
    }

    pub fn slot_state(&self, slot: usize) -> Option<SlotState> {
        self.slots.get(slot).copied()
    }

    /// Eviction weight of a slot. Empty and out-of-range slots report `+inf`.
    pub fn weight(&self, slot: usize) -> f32 {
        self.slots
            .get(slot)
            .map_or(f32::INFINITY, SlotState::priority)
    }

    /// Latent of an occupied slot
    pub fn latent(&self, slot: usize) -> Option<&[f32]> {
        self.is_occupied(slot).then(|| self.latent_slice(slot))
    }

    pub fn payload(&self, slot: usize) -> Option<&Blob> {
        self.storage.payload(slot)
    }

    pub fn meta(&self, slot: usize) -> Option<&[f32]> {
        self.storage.meta(slot)
    }

    /// Stored distance between two slots (`+inf` on the diagonal and for
    /// empty slots)
    pub fn distance(&self, i: usize, j: usize) -> MeshResult<f32> {
        self.check_slot(i)?;
        self.check_slot(j)?;
        Ok(self.pairwise.get(i, j))
    }

    /// Structural edge flag, unfiltered by radius
    pub fn is_edge(&self, i: usize, j: usize) -> MeshResult<bool> {
        self.check_slot(i)?;
        self.check_slot(j)?;
        Ok(self.edge_mask.get(i, j))
    }

    /// Whether `(i, j)` has not been consumed by `mark`
    pub fn is_unvisited(&self, i: usize, j: usize) -> MeshResult<bool> {
        self.check_slot(i)?;
        self.check_slot(j)?;
        Ok(self.visited_mask.get(i, j))
    }

    /// Largest finite weight among occupied slots
    pub fn max_weight(&self) -> Option<f32> {
        self.occupied()
            .map(|s| self.slots[s].priority())
            .filter(|w| w.is_finite())
            .reduce(f32::max)
    }

    /// Payload storage size in bytes
    pub fn payload_bytes(&self) -> usize {
        self.storage.size_bytes()
    }

    /// Payloads of occupied slots, by ascending slot
    pub fn payloads(&self) -> Vec<(usize, &Blob)> {
        self.occupied()
            .filter_map(|s| self.storage.payload(s).map(|p| (s, p)))
            .collect()
    }

    /// Run the configured embedder on a payload and check the output shape
    pub fn embed(&self, payload: &Blob) -> MeshResult<Vec<f32>> {
        let embedder = self.embedder.as_ref().ok_or(MeshError::MissingEmbedder)?;
        let latent = embedder.embed(payload);
        self.check_dim(&latent)?;
        Ok(latent)
    }

    // ========================================================================
    // INSERTION
    // ========================================================================

    /// Insert a batch, evicting the densest slots when out of free space.
    ///
    /// Returns the slot used by each entry, in input order. The whole batch
    /// is validated before anything is written.
    pub fn add(&mut self, entries: Vec<Entry>) -> MeshResult<Vec<usize>> {
        if entries.len() > self.capacity() {
            return Err(MeshError::CapacityExceeded {
                requested: entries.len(),
                capacity: self.capacity(),
            });
        }

        let prepared = entries
            .into_iter()
            .map(|e| self.prepare(e))
            .collect::<MeshResult<Vec<_>>>()?;

        Ok(self.insert(prepared))
    }

    /// Insert bare latents with no payload
    pub fn add_latents(&mut self, latents: Vec<Vec<f32>>) -> MeshResult<Vec<usize>> {
        self.add(latents.into_iter().map(Entry::latent).collect())
    }

    /// Re-embed every stored payload and rewrite its latent in place.
    ///
    /// Slots without a payload keep their latent. Weights are recomputed for
    /// the whole mesh afterwards.
    pub fn update_latents(&mut self) -> MeshResult<()> {
        let embedder = self.embedder.as_ref().ok_or(MeshError::MissingEmbedder)?;

        let mut updates = Vec::new();
        for slot in self.occupied() {
            if let Some(payload) = self.storage.payload(slot) {
                let latent = embedder.embed(payload);
                self.check_dim(&latent)?;
                updates.push((slot, latent));
            }
        }

        let slots: Vec<usize> = updates.iter().map(|(s, _)| *s).collect();
        for (slot, latent) in updates {
            self.write_latent(slot, &latent);
        }

        let all = self.nodes();
        self.connect(&slots, all);

        debug!(updated = slots.len(), "Re-embedded stored payloads");
        Ok(())
    }

    /// Resolve an entry's latent and check its shape
    pub(crate) fn prepare(&self, entry: Entry) -> MeshResult<Prepared> {
        let latent = match entry.latent {
            Some(latent) => latent,
            None => {
                let payload = entry.payload.as_ref().ok_or(MeshError::MissingPayload)?;
                let embedder = self.embedder.as_ref().ok_or(MeshError::MissingEmbedder)?;
                embedder.embed(payload)
            }
        };
        self.check_dim(&latent)?;

        Ok(Prepared {
            latent,
            payload: entry.payload,
            meta: entry.meta,
        })
    }

    /// Write a validated batch. `prepared.len() <= capacity` must hold.
    pub(crate) fn insert(&mut self, prepared: Vec<Prepared>) -> Vec<usize> {
        if prepared.is_empty() {
            return Vec::new();
        }

        let spots = self.select_spots(prepared.len());

        let evicted: Vec<usize> = spots
            .iter()
            .copied()
            .filter(|&s| self.slots[s].is_occupied())
            .collect();
        let mut stale = Vec::new();
        if !evicted.is_empty() {
            debug!(count = evicted.len(), slots = ?evicted, "Evicting densest slots for insertion");
            for &slot in &evicted {
                stale.extend(self.vacate(slot));
            }
        }

        for (&slot, item) in spots.iter().zip(prepared) {
            self.write_latent(slot, &item.latent);
            self.slots[slot] = SlotState::Occupied { weight: 0.0 };
            self.generations[slot] = self.generations[slot].wrapping_add(1);
            self.storage.put(slot, item.payload, item.meta);
        }

        self.connect(&spots, stale);

        trace!(slots = ?spots, "Inserted batch");
        spots
    }

    /// Pick `n` target slots: empty first by index, then occupied by
    /// descending weight, ties by index.
    fn select_spots(&self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.capacity()).collect();
        let cmp = |a: &usize, b: &usize| self.eviction_order(*a, *b);

        if n < order.len() {
            order.select_nth_unstable_by(n - 1, cmp);
            order.truncate(n);
        }
        order.sort_unstable_by(cmp);
        order
    }

    fn eviction_order(&self, a: usize, b: usize) -> Ordering {
        match (self.slots[a], self.slots[b]) {
            (SlotState::Empty, SlotState::Empty) => a.cmp(&b),
            (SlotState::Empty, SlotState::Occupied { .. }) => Ordering::Less,
            (SlotState::Occupied { .. }, SlotState::Empty) => Ordering::Greater,
            (SlotState::Occupied { weight: wa }, SlotState::Occupied { weight: wb }) => {
                wb.total_cmp(&wa).then(a.cmp(&b))
            }
        }
    }

    fn write_latent(&mut self, slot: usize, latent: &[f32]) {
        let d = self.latent_dim();
        self.latents[slot * d..(slot + 1) * d].copy_from_slice(latent);
    }

    /// Recompute distance rows and edge masks for freshly written slots,
    /// then refresh weights for them, their neighbours, and `stale`.
    fn connect(&mut self, spots: &[usize], mut stale: Vec<usize>) {
        let occupied = self.nodes();
        let r = self.config.neighbor_r;
        let mut nan_count = 0usize;

        for &s in spots {
            self.pairwise.fill_row_col(s, f32::INFINITY);
            for &j in &occupied {
                if j == s {
                    continue;
                }
                let d = self
                    .kernel
                    .distance(self.latent_slice(s), self.latent_slice(j));
                if d.is_nan() {
                    nan_count += 1;
                }
                self.pairwise.set_symmetric(s, j, d);
                if d < r {
                    stale.push(j);
                }
            }
            self.edge_mask.fill_row_col(s, true);
        }
        self.pairwise.fill_diagonal(f32::INFINITY);

        if nan_count > 0 {
            warn!(nan_count, kernel = self.kernel.name(), "Kernel produced NaN distances; those pairs never form edges");
        }

        stale.extend_from_slice(spots);
        stale.sort_unstable();
        stale.dedup();
        for slot in stale {
            self.refresh_weight(slot);
        }
    }

    fn refresh_weight(&mut self, slot: usize) {
        if self.slots[slot].is_occupied() {
            let weight = compute_weight(self.pairwise.row(slot), self.config.neighbor_r);
            self.slots[slot] = SlotState::Occupied { weight };
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// All occupied slots with `r_min < distance < r`, nearest first
    pub fn query(&self, latent: &[f32], r: Option<f32>, r_min: Option<f32>) -> MeshResult<Vec<Hit>> {
        self.check_dim(latent)?;
        Ok(self.scan(latent, r, r_min, None))
    }

    /// `query` for several latents. Fails on the first malformed one.
    pub fn query_batch(
        &self,
        latents: &[Vec<f32>],
        r: Option<f32>,
        r_min: Option<f32>,
    ) -> MeshResult<Vec<Vec<Hit>>> {
        latents.iter().map(|l| self.query(l, r, r_min)).collect()
    }

    /// Nearest slot within the bounds.
    ///
    /// A slot probe never matches itself.
    pub fn closest(&self, probe: Probe<'_>, r: Option<f32>, r_min: Option<f32>) -> MeshResult<Option<Hit>> {
        let hits = match probe {
            Probe::Latent(latent) => {
                self.check_dim(latent)?;
                self.scan(latent, r, r_min, None)
            }
            Probe::Slot(slot) => {
                self.check_slot(slot)?;
                if !self.slots[slot].is_occupied() {
                    return Err(MeshError::EmptySlot(slot));
                }
                self.scan(self.latent_slice(slot), r, r_min, Some(slot))
            }
        };
        Ok(hits.into_iter().next())
    }

    /// Snap a raw latent onto the mesh. `None` when nothing qualifies.
    pub fn localize(&self, latent: &[f32], r: Option<f32>, r_min: Option<f32>) -> MeshResult<Option<Hit>> {
        self.closest(Probe::Latent(latent), r, r_min)
    }

    /// Traversable neighbours of `slot`, nearest first.
    ///
    /// An edge qualifies when it is unvisited, inside the radius band, and,
    /// unless soft pruning is enabled, structurally present.
    pub fn neighbors(&self, slot: usize) -> MeshResult<Vec<usize>> {
        self.check_slot(slot)?;

        let row = self.pairwise.row(slot);
        let soft = self.config.enable_soft_prune;
        let mut found: Vec<(usize, f32)> = (0..self.capacity())
            .filter(|&j| j != slot)
            .filter(|&j| self.visited_mask.get(slot, j))
            .filter(|&j| soft || self.edge_mask.get(slot, j))
            .filter(|&j| within_band(row[j], Some(self.config.neighbor_r), self.config.neighbor_r_min))
            .map(|j| (j, row[j]))
            .collect();

        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(found.into_iter().map(|(j, _)| j).collect())
    }

    fn scan(&self, latent: &[f32], r: Option<f32>, r_min: Option<f32>, exclude: Option<usize>) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .occupied()
            .filter(|&s| Some(s) != exclude)
            .filter_map(|s| {
                let d = self.kernel.distance(latent, self.latent_slice(s));
                within_band(d, r, r_min).then_some(Hit::new(s, d))
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.slot.cmp(&b.slot)));
        hits
    }

    // ========================================================================
    // EDGE OPERATIONS
    // ========================================================================

    /// Prune the structural edge `i -> j`.
    ///
    /// With `dilate`, the stored distance is multiplied in both directions,
    /// which can push the pair out of the radius band.
    pub fn remove_edge(&mut self, i: usize, j: usize, dilate: Option<f32>) -> MeshResult<()> {
        self.check_slot(i)?;
        self.check_slot(j)?;

        if let Some(factor) = dilate {
            if i != j {
                let d = self.pairwise.get(i, j) * factor;
                self.pairwise.set_symmetric(i, j, d);
                self.refresh_weight(i);
                self.refresh_weight(j);
            }
        }
        self.edge_mask.set(i, j, false);

        trace!(i, j, ?dilate, "Removed edge");
        Ok(())
    }

    /// Consume `i -> j` for the current traversal episode
    pub fn mark(&mut self, i: usize, j: usize) -> MeshResult<()> {
        self.check_slot(i)?;
        self.check_slot(j)?;
        self.visited_mask.set(i, j, false);
        Ok(())
    }

    /// Make every edge traversable again (start a new search episode)
    pub fn reset_visited(&mut self) {
        self.visited_mask.fill(true);
    }

    /// Set the structural edges from every slot near `latent` to every slot
    /// near `target` (both within `r`) to `add`.
    ///
    /// Without a target, every outgoing edge of the matched slots is set.
    /// Returns the matched source slots, nearest first.
    pub fn remove_similar(
        &mut self,
        latent: &[f32],
        target: Option<&[f32]>,
        r: f32,
        add: bool,
    ) -> MeshResult<Vec<usize>> {
        self.check_dim(latent)?;
        let targets: Vec<usize> = match target {
            Some(target) => {
                self.check_dim(target)?;
                self.scan_slots(target, r)
            }
            None => (0..self.capacity()).collect(),
        };
        let sources = self.scan_slots(latent, r);

        for &u in &sources {
            for &v in &targets {
                if u != v {
                    self.edge_mask.set(u, v, add);
                }
            }
        }

        trace!(sources = sources.len(), targets = targets.len(), add, "Set similar edges");
        Ok(sources)
    }

    /// Prune every incoming edge of the slots within `r` of `latent`.
    ///
    /// Only edges from current traversable neighbours are cleared; outgoing
    /// edges are kept. Returns the affected slots, nearest first.
    pub fn remove_incoming(&mut self, latent: &[f32], r: f32) -> MeshResult<Vec<usize>> {
        self.check_dim(latent)?;
        let hits = self.scan_slots(latent, r);

        for &u in &hits {
            for v in self.neighbors(u)? {
                self.edge_mask.set(v, u, false);
            }
        }

        debug!(slots = ?hits, "Removed incoming edges");
        Ok(hits)
    }

    /// Directional pruning toward a goal.
    ///
    /// Takes one unit step (in kernel norm) from `latent` toward `goal`. For
    /// every source within `r0` of `latent` and every target within `r` of
    /// the step point, the edge `source -> target` is pruned when the
    /// displacement projected onto the step direction (negative components
    /// clipped to zero) has kernel norm above `d0`. Returns the pruned pairs.
    pub fn remove_toward(
        &mut self,
        latent: &[f32],
        goal: &[f32],
        r: f32,
        r0: f32,
        d0: f32,
    ) -> MeshResult<Vec<(usize, usize)>> {
        self.check_dim(latent)?;
        self.check_dim(goal)?;

        let origin = vec![0.0f32; self.latent_dim()];
        let mut step: Vec<f32> = goal.iter().zip(latent).map(|(g, z)| g - z).collect();
        let norm = self.kernel.distance(&step, &origin);
        if !(norm.is_finite() && norm > 0.0) {
            return Ok(Vec::new());
        }
        step.iter_mut().for_each(|x| *x /= norm);
        let ahead: Vec<f32> = latent.iter().zip(&step).map(|(z, s)| z + s).collect();

        let sources = self.scan_slots(latent, r0);
        let targets = self.scan_slots(&ahead, r);

        let mut pruned = Vec::new();
        for &u in &sources {
            for &v in &targets {
                if u == v {
                    continue;
                }
                let projected: Vec<f32> = self
                    .latent_slice(v)
                    .iter()
                    .zip(self.latent_slice(u))
                    .zip(&step)
                    .map(|((to, from), s)| ((to - from) * s).max(0.0))
                    .collect();
                if self.kernel.distance(&projected, &origin) > d0 {
                    pruned.push((u, v));
                }
            }
        }

        for &(u, v) in &pruned {
            self.edge_mask.set(u, v, false);
        }

        debug!(pruned = pruned.len(), "Pruned edges toward goal");
        Ok(pruned)
    }

    /// Occupied pairs inside `neighbor_r` whose structural edge was pruned
    pub fn pruned_edges(&self) -> Vec<(usize, usize)> {
        let nodes = self.nodes();
        let r = self.config.neighbor_r;
        let mut pruned = Vec::new();
        for &i in &nodes {
            for &j in &nodes {
                if i != j && !self.edge_mask.get(i, j) && self.pairwise.get(i, j) < r {
                    pruned.push((i, j));
                }
            }
        }
        pruned
    }

    /// Read-only edge view at the current radii
    pub fn edges(&self) -> EdgeView<'_> {
        EdgeView::new(
            &self.pairwise,
            &self.edge_mask,
            &self.visited_mask,
            Some(self.config.neighbor_r),
            self.config.neighbor_r_min,
        )
    }

    pub fn summary(&self) -> GraphSummary<'_> {
        GraphSummary::new(self)
    }

    // ========================================================================
    // REMOVAL
    // ========================================================================

    /// Clear the given slots and every edge touching them.
    ///
    /// All indices are checked before any slot is cleared. Latent bytes are
    /// left in place until the slot is reused.
    pub fn remove_vertex(&mut self, slots: &[usize]) -> MeshResult<()> {
        for &slot in slots {
            self.check_slot(slot)?;
        }
        self.evict(slots);
        Ok(())
    }

    /// Evict up to `n` occupied slots with the largest weight
    pub fn remove_highest(&mut self, n: usize) -> Vec<usize> {
        let mut candidates = self.nodes();
        candidates.sort_by(|a, b| self.eviction_order(*a, *b));
        candidates.truncate(n);

        if !candidates.is_empty() {
            debug!(count = candidates.len(), slots = ?candidates, "Removing highest-weight slots");
        }
        self.evict(&candidates);
        candidates
    }

    /// Evict every occupied slot whose weight exceeds `threshold`
    pub fn pressure_release(&mut self, threshold: f32) -> Vec<usize> {
        let over: Vec<usize> = self
            .occupied()
            .filter(|&s| self.slots[s].priority() > threshold)
            .collect();

        debug!(threshold, released = over.len(), "Pressure release");
        self.evict(&over);
        over
    }

    /// Greedy thinning: keep one representative per `r`-cluster.
    ///
    /// Slots are visited in ascending order. Returns the removed slots.
    pub fn sparsify(&mut self, r: f32) -> Vec<usize> {
        let mut pending: BTreeSet<usize> = self.occupied().collect();
        let mut removed = Vec::new();

        while let Some(keep) = pending.pop_first() {
            let cluster: Vec<usize> = self
                .scan(self.latent_slice(keep), Some(r), None, Some(keep))
                .into_iter()
                .map(|h| h.slot)
                .collect();

            for slot in &cluster {
                pending.remove(slot);
            }
            self.evict(&cluster);
            removed.extend(cluster);
        }

        debug!(r, removed = removed.len(), remaining = self.len(), "Sparsified mesh");
        removed
    }

    /// Reset to the freshly constructed state
    pub fn clear(&mut self) {
        self.slots.fill(SlotState::Empty);
        self.pairwise.fill(f32::INFINITY);
        self.edge_mask.fill(true);
        self.visited_mask.fill(true);
        self.storage.clear();

        info!("Cleared mesh memory");
    }

    /// Vacate slots and refresh their former neighbours. Indices must be valid.
    pub(crate) fn evict(&mut self, slots: &[usize]) {
        let mut stale = Vec::new();
        for &slot in slots {
            stale.extend(self.vacate(slot));
        }
        stale.sort_unstable();
        stale.dedup();
        for slot in stale {
            self.refresh_weight(slot);
        }
    }

    /// Clear one slot; returns the occupied slots that were inside its radius
    fn vacate(&mut self, slot: usize) -> Vec<usize> {
        let r = self.config.neighbor_r;
        let former: Vec<usize> = self
            .occupied()
            .filter(|&j| j != slot && self.pairwise.get(slot, j) < r)
            .collect();

        self.slots[slot] = SlotState::Empty;
        self.pairwise.fill_row_col(slot, f32::INFINITY);
        self.edge_mask.fill_row_col(slot, false);
        self.visited_mask.fill_row_col(slot, true);
        self.storage.take(slot);

        former
    }

    // ========================================================================
    // TUNING & SAMPLING
    // ========================================================================

    /// Change the radius band and recompute every weight
    pub fn update_r(&mut self, neighbor_r: f32, neighbor_r_min: Option<f32>) -> MeshResult<()> {
        check_radius(neighbor_r, neighbor_r_min)?;

        self.config.neighbor_r = neighbor_r;
        self.config.neighbor_r_min = neighbor_r_min;
        for slot in 0..self.capacity() {
            self.refresh_weight(slot);
        }

        debug!(neighbor_r, ?neighbor_r_min, "Updated neighbour radius");
        Ok(())
    }

    /// `size` distinct occupied slots, uniformly at random
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, size: usize) -> MeshResult<Vec<usize>> {
        let nodes = self.nodes();
        if size > nodes.len() {
            return Err(MeshError::SampleTooLarge {
                requested: size,
                available: nodes.len(),
            });
        }
        Ok(nodes.choose_multiple(rng, size).copied().collect())
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn scan_slots(&self, latent: &[f32], r: f32) -> Vec<usize> {
        self.scan(latent, Some(r), None, None)
            .into_iter()
            .map(|h| h.slot)
            .collect()
    }

    fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_occupied())
            .map(|(i, _)| i)
    }

    pub(crate) fn latent_slice(&self, slot: usize) -> &[f32] {
        let d = self.latent_dim();
        &self.latents[slot * d..(slot + 1) * d]
    }

    pub(crate) fn check_slot(&self, slot: usize) -> MeshResult<()> {
        if slot >= self.capacity() {
            return Err(MeshError::SlotOutOfRange {
                slot,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    fn check_dim(&self, latent: &[f32]) -> MeshResult<()> {
        if latent.len() != self.latent_dim() {
            return Err(MeshError::DimensionalityMismatch {
                expected: self.latent_dim(),
                got: latent.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for MeshMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.len();
        if len < self.capacity() {
            write!(f, "MeshMemory({}, n={}, latent_dim={})", len, self.capacity(), self.latent_dim())
        } else {
            write!(f, "MeshMemory({}, latent_dim={})", len, self.latent_dim())
        }
    }
}

impl fmt::Debug for MeshMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshMemory")
            .field("config", &self.config)
            .field("kernel", &self.kernel.name())
            .field("len", &self.len())
            .finish()
    }
}
