//! # Edge View
//!
//! Read-only, lazily filtered view over the distance matrix and edge masks.
//!
//! Two questions are answered differently on purpose:
//! - `len` / `iter` - does the edge structurally exist inside the radius band?
//!   (visited status ignored)
//! - `get` / `traversable` - can a search still walk it? (edge AND unvisited)

use crate::core::matrix::SquareMatrix;

/// `r_min < d < r` for the bounds that are set. NaN never qualifies.
pub(crate) fn within_band(d: f32, r: Option<f32>, r_min: Option<f32>) -> bool {
    !d.is_nan() && r.map_or(true, |r| d < r) && r_min.map_or(true, |m| d > m)
}

/// Attributes of a traversable edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeAttrs {
    /// Stored distance between the endpoints
    pub weight: f32,
}

/// Borrowed edge view. Never copies the matrices.
#[derive(Clone, Copy)]
pub struct EdgeView<'a> {
    pairwise: &'a SquareMatrix<f32>,
    edge_mask: &'a SquareMatrix<bool>,
    visited_mask: &'a SquareMatrix<bool>,
    neighbor_r: Option<f32>,
    neighbor_r_min: Option<f32>,
}

impl<'a> EdgeView<'a> {
    pub fn new(
        pairwise: &'a SquareMatrix<f32>,
        edge_mask: &'a SquareMatrix<bool>,
        visited_mask: &'a SquareMatrix<bool>,
        neighbor_r: Option<f32>,
        neighbor_r_min: Option<f32>,
    ) -> Self {
        Self {
            pairwise,
            edge_mask,
            visited_mask,
            neighbor_r,
            neighbor_r_min,
        }
    }

    /// Number of structural edges inside the radius band
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Structural edges `(i, j)`, `i != j`, in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + 'a {
        let view = *self;
        let n = view.pairwise.n();
        (0..n)
            .flat_map(move |i| (0..n).map(move |j| (i, j)))
            .filter(move |&(i, j)| {
                i != j
                    && view.edge_mask.get(i, j)
                    && within_band(view.pairwise.get(i, j), view.neighbor_r, view.neighbor_r_min)
            })
    }

    /// Attributes of `(i, j)` if it is present and not yet visited.
    ///
    /// Radius is not checked here. Out-of-range indices yield `None`.
    pub fn get(&self, i: usize, j: usize) -> Option<EdgeAttrs> {
        let n = self.pairwise.n();
        if i >= n || j >= n || i == j {
            return None;
        }
        (self.edge_mask.get(i, j) && self.visited_mask.get(i, j)).then(|| EdgeAttrs {
            weight: self.pairwise.get(i, j),
        })
    }

    /// Materialized list of edges that are present, unvisited, and inside
    /// the given band. Unset bounds fall back to the view's radii.
    pub fn traversable(&self, r: Option<f32>, r_min: Option<f32>) -> Vec<(usize, usize)> {
        let r = r.or(self.neighbor_r);
        let r_min = r_min.or(self.neighbor_r_min);
        let n = self.pairwise.n();

        let mut out = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if i != j
                    && self.edge_mask.get(i, j)
                    && self.visited_mask.get(i, j)
                    && within_band(self.pairwise.get(i, j), r, r_min)
                {
                    out.push((i, j));
                }
            }
        }
        out
    }

    pub fn neighbor_r(&self) -> Option<f32> {
        self.neighbor_r
    }

    pub fn neighbor_r_min(&self) -> Option<f32> {
        self.neighbor_r_min
    }
}

impl<'a> IntoIterator for &EdgeView<'a> {
    type Item = (usize, usize);
    type IntoIter = Box<dyn Iterator<Item = (usize, usize)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MeshConfig;
    use crate::engine::MeshMemory;

    fn line_mesh() -> MeshMemory {
        let mut mesh = MeshMemory::euclidean(MeshConfig::new(4, 1).with_neighbor_r(1.0)).unwrap();
        mesh.add_latents(vec![vec![0.0], vec![0.5], vec![0.9], vec![5.0]])
            .unwrap();
        mesh
    }

    #[test]
    fn test_within_band() {
        assert!(within_band(0.5, Some(1.0), None));
        assert!(!within_band(1.0, Some(1.0), None));
        assert!(!within_band(0.1, Some(1.0), Some(0.1)));
        assert!(within_band(f32::INFINITY, None, None));
        assert!(!within_band(f32::NAN, None, None));
    }

    #[test]
    fn test_len_and_iter_agree() {
        let mesh = line_mesh();
        let edges = mesh.edges();

        let pairs: Vec<_> = edges.iter().collect();

        assert_eq!(edges.len(), pairs.len());
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)]);
        assert!(!pairs.iter().any(|&(i, j)| i == j));
    }

    #[test]
    fn test_into_iterator() {
        let mesh = line_mesh();
        let edges = mesh.edges();

        let mut count = 0;
        for (i, j) in &edges {
            assert_ne!(i, j);
            count += 1;
        }
        assert_eq!(count, 6);
    }

    #[test]
    fn test_get_returns_weight() {
        let mesh = line_mesh();
        let edges = mesh.edges();

        assert_eq!(edges.get(0, 1), Some(EdgeAttrs { weight: 0.5 }));
        assert_eq!(edges.get(1, 1), None);
        assert_eq!(edges.get(0, 99), None);
    }

    #[test]
    fn test_marked_edge_still_counted_but_not_gettable() {
        let mut mesh = line_mesh();
        let before = mesh.edges().len();

        mesh.mark(0, 1).unwrap();
        let edges = mesh.edges();

        assert_eq!(edges.get(0, 1), None);
        assert!(edges.get(1, 0).is_some());
        assert_eq!(edges.len(), before);
        assert!(edges.iter().any(|e| e == (0, 1)));
        assert!(!edges.traversable(None, None).contains(&(0, 1)));
    }

    #[test]
    fn test_pruned_edge_leaves_structure() {
        let mut mesh = line_mesh();

        mesh.remove_edge(0, 2, None).unwrap();
        let edges = mesh.edges();

        assert_eq!(edges.len(), 5);
        assert_eq!(edges.get(0, 2), None);
        assert!(edges.get(2, 0).is_some());
    }

    #[test]
    fn test_traversable_bounds() {
        let mesh = line_mesh();
        let edges = mesh.edges();

        // Defaults to the view radius
        assert_eq!(edges.traversable(None, None).len(), 6);

        let tight = edges.traversable(Some(0.45), None);
        assert_eq!(tight, vec![(1, 2), (2, 1)]);

        let band = edges.traversable(Some(10.0), Some(0.6));
        assert!(band.contains(&(0, 2)));
        assert!(band.contains(&(0, 3)));
        assert!(!band.contains(&(0, 1)));
    }

    #[test]
    fn test_empty_mesh_view() {
        let mesh = MeshMemory::euclidean(MeshConfig::new(3, 2)).unwrap();
        let edges = mesh.edges();

        assert!(edges.is_empty());
        assert_eq!(edges.len(), 0);
        assert!(edges.traversable(None, None).is_empty());
    }
}
