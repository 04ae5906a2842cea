//! Graph statistics for logging and inspection.

use std::fmt;

use super::MeshMemory;

/// Lazy statistics over a mesh's proximity graph
pub struct GraphSummary<'a> {
    mesh: &'a MeshMemory,
}

impl<'a> GraphSummary<'a> {
    pub fn new(mesh: &'a MeshMemory) -> Self {
        Self { mesh }
    }

    /// Occupied slots
    pub fn vertices(&self) -> usize {
        self.mesh.len()
    }

    /// Structural edges inside the radius band (directed count)
    pub fn edges(&self) -> usize {
        self.mesh.edges().len()
    }

    /// Edges per vertex, `None` for an empty mesh
    pub fn sparsity(&self) -> Option<f32> {
        let v = self.vertices();
        (v > 0).then(|| self.edges() as f32 / v as f32)
    }

    /// Connected components among occupied slots, edges taken as undirected
    pub fn islands(&self) -> usize {
        let n = self.mesh.capacity();
        let mut parent: Vec<usize> = (0..n).collect();

        for (i, j) in self.mesh.edges().iter() {
            let (a, b) = (find(&mut parent, i), find(&mut parent, j));
            if a != b {
                parent[a.max(b)] = a.min(b);
            }
        }

        let mut roots: Vec<usize> = self
            .mesh
            .nodes()
            .into_iter()
            .map(|v| find(&mut parent, v))
            .collect();
        roots.sort_unstable();
        roots.dedup();
        roots.len()
    }

    /// In-range pairs whose structural edge was pruned
    pub fn pruned(&self) -> usize {
        self.mesh.pruned_edges().len()
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

impl fmt::Display for GraphSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mesh = self.mesh;
        writeln!(f, "{}:", mesh)?;
        writeln!(f, "    neighbor r: {}", mesh.neighbor_r())?;
        match mesh.neighbor_r_min() {
            Some(r_min) => writeln!(f, "    neighbor r (min): {}", r_min)?,
            None => writeln!(f, "    neighbor r (min): None")?,
        }
        writeln!(f, "    vertices: {}", self.vertices())?;
        writeln!(f, "    edges: {}", self.edges())?;
        match self.sparsity() {
            Some(s) => writeln!(f, "    sparsity: {}", s)?,
            None => writeln!(f, "    sparsity: N/A")?,
        }
        writeln!(f, "    islands: {}", self.islands())?;
        write!(f, "    pruned: {}", self.pruned())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::MeshConfig;
    use crate::engine::MeshMemory;

    fn two_clusters() -> MeshMemory {
        let mut mesh = MeshMemory::euclidean(MeshConfig::new(6, 2).with_neighbor_r(1.0)).unwrap();
        mesh.add_latents(vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![20.0, 20.0],
        ])
        .unwrap();
        mesh
    }

    #[test]
    fn test_counts() {
        let mesh = two_clusters();
        let summary = mesh.summary();

        assert_eq!(summary.vertices(), 5);
        assert_eq!(summary.edges(), 4);
        assert_eq!(summary.sparsity(), Some(0.8));
        assert_eq!(summary.islands(), 3);
        assert_eq!(summary.pruned(), 0);
    }

    #[test]
    fn test_islands_merge_through_chain() {
        let mut mesh = MeshMemory::euclidean(MeshConfig::new(4, 1).with_neighbor_r(1.0)).unwrap();
        mesh.add_latents(vec![vec![0.0], vec![0.8], vec![1.6], vec![2.4]])
            .unwrap();

        assert_eq!(mesh.summary().islands(), 1);

        mesh.remove_vertex(&[1]).unwrap();
        assert_eq!(mesh.summary().islands(), 2);
    }

    #[test]
    fn test_pruned_count() {
        let mut mesh = two_clusters();
        mesh.remove_edge(0, 1, None).unwrap();

        let summary = mesh.summary();
        assert_eq!(summary.pruned(), 1);
        assert_eq!(summary.edges(), 3);
        // Reverse direction still connects the pair
        assert_eq!(summary.islands(), 3);
    }

    #[test]
    fn test_empty_summary() {
        let mesh = MeshMemory::euclidean(MeshConfig::new(3, 2)).unwrap();
        let summary = mesh.summary();

        assert_eq!(summary.sparsity(), None);
        assert_eq!(summary.islands(), 0);
        assert!(summary.to_string().contains("sparsity: N/A"));
    }

    #[test]
    fn test_report() {
        let mesh = two_clusters();
        let report = mesh.summary().to_string();

        assert!(report.starts_with("MeshMemory(5, n=6, latent_dim=2):"));
        assert!(report.contains("neighbor r: 1"));
        assert!(report.contains("neighbor r (min): None"));
        assert!(report.contains("edges: 4"));
        assert!(report.contains("islands: 3"));
        assert!(report.ends_with("pruned: 0"));
    }
}
