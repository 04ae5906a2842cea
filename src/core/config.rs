//! # Configuration
//!
//! Everything fixed at construction time: capacity, latent dimension, and
//! the radius band that defines which slot pairs count as edges.

use serde::{Deserialize, Serialize};

use crate::ports::{MeshError, MeshResult};

/// Mesh memory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Number of slots, N = |V|
    pub capacity: usize,

    /// Dimension of every latent vector
    pub latent_dim: usize,

    /// Upper radius: pairs closer than this are edges
    pub neighbor_r: f32,

    /// Lower radius: pairs must be farther than this to be edges
    pub neighbor_r_min: Option<f32>,

    /// When set, `neighbors` ignores the structural edge mask and relies on
    /// the radius band alone, so removed edges stay traversable unless dilated
    /// out of range.
    pub enable_soft_prune: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            latent_dim: 10,
            neighbor_r: 1.0,
            neighbor_r_min: None,
            enable_soft_prune: true,
        }
    }
}

impl MeshConfig {
    /// Config with the given capacity and latent dimension, defaults elsewhere
    pub fn new(capacity: usize, latent_dim: usize) -> Self {
        Self {
            capacity,
            latent_dim,
            ..Default::default()
        }
    }

    pub fn with_neighbor_r(mut self, neighbor_r: f32) -> Self {
        self.neighbor_r = neighbor_r;
        self
    }

    pub fn with_neighbor_r_min(mut self, neighbor_r_min: f32) -> Self {
        self.neighbor_r_min = Some(neighbor_r_min);
        self
    }

    pub fn with_soft_prune(mut self, enabled: bool) -> Self {
        self.enable_soft_prune = enabled;
        self
    }

    /// Reject configurations the cache cannot honour
    pub fn validate(&self) -> MeshResult<()> {
        if self.capacity == 0 {
            return Err(MeshError::InvalidConfig("capacity must be > 0".into()));
        }
        if self.latent_dim == 0 {
            return Err(MeshError::InvalidConfig("latent_dim must be > 0".into()));
        }
        if self
            .capacity
            .checked_mul(self.capacity)
            .and(self.capacity.checked_mul(self.latent_dim))
            .is_none()
        {
            return Err(MeshError::InvalidConfig(format!(
                "capacity {} with latent_dim {} overflows storage size",
                self.capacity, self.latent_dim
            )));
        }
        check_radius(self.neighbor_r, self.neighbor_r_min)
    }
}

/// Radius band check shared by construction and `update_r`
pub(crate) fn check_radius(r: f32, r_min: Option<f32>) -> MeshResult<()> {
    if !(r.is_finite() && r > 0.0) {
        return Err(MeshError::InvalidConfig(format!(
            "neighbor_r must be finite and > 0, got {}",
            r
        )));
    }
    if let Some(r_min) = r_min {
        if r_min.is_nan() || r_min >= r {
            return Err(MeshError::InvalidConfig(format!(
                "neighbor_r_min ({}) must be below neighbor_r ({})",
                r_min, r
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MeshConfig::default();
        assert_eq!(config.capacity, 100);
        assert_eq!(config.latent_dim, 10);
        assert_eq!(config.neighbor_r, 1.0);
        assert!(config.neighbor_r_min.is_none());
        assert!(config.enable_soft_prune);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = MeshConfig::new(4, 2)
            .with_neighbor_r(0.5)
            .with_neighbor_r_min(0.1)
            .with_soft_prune(false);
        assert_eq!(config.capacity, 4);
        assert_eq!(config.neighbor_r_min, Some(0.1));
        assert!(!config.enable_soft_prune);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(MeshConfig::new(0, 2).validate().is_err());
        assert!(MeshConfig::new(4, 0).validate().is_err());
        assert!(MeshConfig::new(4, 2).with_neighbor_r(0.0).validate().is_err());
        assert!(MeshConfig::new(4, 2)
            .with_neighbor_r(f32::INFINITY)
            .validate()
            .is_err());
        assert!(MeshConfig::new(4, 2)
            .with_neighbor_r(1.0)
            .with_neighbor_r_min(1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_overflowing_sizes() {
        let huge = MeshConfig::new(usize::MAX / 2, 4).validate();
        assert!(matches!(huge, Err(MeshError::InvalidConfig(_))));

        let wide = MeshConfig::new(1 << 16, usize::MAX / 4).validate();
        assert!(matches!(wide, Err(MeshError::InvalidConfig(_))));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = MeshConfig::new(8, 3).with_neighbor_r_min(0.02);
        let json = serde_json::to_string(&config).unwrap();
        let back: MeshConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
