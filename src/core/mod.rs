//! # Core
//!
//! Pure data types with no I/O:
//! - `Blob` - opaque payload bytes attached to a slot
//! - `SlotState` - whether a slot holds a live latent, and its weight
//! - `Hit` - one query result
//! - `Probe` - what `closest` is asked about
//!
//! Submodules hold the kernel functions, the configuration, and the dense
//! square matrix used for distances and edge masks.

pub mod config;
pub mod kernel;
pub mod matrix;

use serde::{Deserialize, Serialize};

/// Opaque payload stored alongside a latent (an image, an observation, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self {
            data: s.as_bytes().to_vec(),
        }
    }

    /// Interpret the bytes as UTF-8, if they are
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Occupancy of one slot.
///
/// Emptiness is its own variant rather than an infinite weight, so a real
/// latent whose density happens to overflow is never mistaken for free space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SlotState {
    #[default]
    Empty,
    Occupied {
        /// Local density around the slot. Higher = more redundant.
        weight: f32,
    },
}

impl SlotState {
    pub fn is_occupied(&self) -> bool {
        matches!(self, SlotState::Occupied { .. })
    }

    /// Eviction priority. Empty slots report `+inf` so they always win
    /// "largest first" selection.
    pub fn priority(&self) -> f32 {
        match self {
            SlotState::Empty => f32::INFINITY,
            SlotState::Occupied { weight } => *weight,
        }
    }
}

/// A query match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Slot index of the match
    pub slot: usize,

    /// Kernel distance from the query
    pub distance: f32,
}

impl Hit {
    pub fn new(slot: usize, distance: f32) -> Self {
        Self { slot, distance }
    }
}

/// Subject of a `closest` lookup
#[derive(Debug, Clone, Copy)]
pub enum Probe<'a> {
    /// A raw latent vector
    Latent(&'a [f32]),
    /// The latent currently stored in a slot
    Slot(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_str_roundtrip() {
        let blob = Blob::from_str("frame-0");
        assert_eq!(blob.as_str(), Some("frame-0"));
        assert_eq!(blob.size(), 7);
        assert_eq!(Blob::empty().size(), 0);
    }

    #[test]
    fn test_slot_priority() {
        assert_eq!(SlotState::Empty.priority(), f32::INFINITY);
        assert_eq!(SlotState::Occupied { weight: 2.5 }.priority(), 2.5);
        assert!(!SlotState::default().is_occupied());
    }
}
