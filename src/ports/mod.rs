//! # Ports
//!
//! Trait contracts between the mesh engine and its collaborators:
//! - `SlotStore` - where payloads and metadata live
//! - `Embed` - how raw payloads become latent vectors
//!
//! Plus the error type every fallible operation returns.

use thiserror::Error;

use crate::core::Blob;

// ============================================================================
// ERRORS
// ============================================================================

/// Contract violations detected at the mesh API boundary.
///
/// Every one of these is raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("Dimensionality mismatch: expected {expected}, got {got}")]
    DimensionalityMismatch { expected: usize, got: usize },

    #[error("Batch of {requested} exceeds capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("Slot {slot} out of range for capacity {capacity}")]
    SlotOutOfRange { slot: usize, capacity: usize },

    #[error("Slot {0} is empty")]
    EmptySlot(usize),

    #[error("Entry has no latent and no embedder is configured")]
    MissingEmbedder,

    #[error("Entry has neither a latent nor a payload")]
    MissingPayload,

    #[error("Cannot sample {requested} slots from {available}")]
    SampleTooLarge { requested: usize, available: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

pub type MeshResult<T> = Result<T, MeshError>;

// ============================================================================
// SLOT STORE
// ============================================================================

/// Per-slot storage for payloads and coordinate metadata.
///
/// Latents and distances live in the engine; this port only owns what the
/// engine never computes on.
pub trait SlotStore: Send + Sync {
    /// Attach payload and metadata to a slot, replacing what was there
    fn put(&mut self, slot: usize, payload: Option<Blob>, meta: Option<Vec<f32>>);

    fn payload(&self, slot: usize) -> Option<&Blob>;

    fn meta(&self, slot: usize) -> Option<&[f32]>;

    /// Detach and return everything stored for a slot
    fn take(&mut self, slot: usize) -> (Option<Blob>, Option<Vec<f32>>);

    /// Number of slots holding a payload or metadata
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate heap usage in bytes
    fn size_bytes(&self) -> usize;

    fn clear(&mut self);
}

// ============================================================================
// EMBED
// ============================================================================

/// Maps a raw payload to a latent vector
pub trait Embed: Send + Sync {
    fn embed(&self, payload: &Blob) -> Vec<f32>;
}

/// Wraps a closure as an embedder
pub struct FnEmbed<F>(pub F);

impl<F> Embed for FnEmbed<F>
where
    F: Fn(&Blob) -> Vec<f32> + Send + Sync,
{
    fn embed(&self, payload: &Blob) -> Vec<f32> {
        (self.0)(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = MeshError::DimensionalityMismatch { expected: 3, got: 2 };
        assert_eq!(e.to_string(), "Dimensionality mismatch: expected 3, got 2");

        let e = MeshError::SlotOutOfRange { slot: 9, capacity: 4 };
        assert_eq!(e.to_string(), "Slot 9 out of range for capacity 4");
    }

    #[test]
    fn test_fn_embed() {
        let embed = FnEmbed(|b: &Blob| vec![b.size() as f32, 0.0]);
        assert_eq!(embed.embed(&Blob::from_str("abc")), vec![3.0, 0.0]);
    }
}
