//! # Kernels
//!
//! Distance functions over pairs of latent vectors.
//!
//! A kernel must be symmetric and non-negative. It is expected to return `0`
//! for identical inputs, but self-edges are excluded by the distance matrix
//! diagonal, never by kernel output.

/// Distance between two latent vectors
pub trait Kernel: Send + Sync {
    /// Distance from `a` to `b`. Both slices have the same length.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;

    /// Short name, used in reports and bindings
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// L2 (Euclidean) distance. The default kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Kernel for Euclidean {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }

    fn name(&self) -> &'static str {
        "l2"
    }
}

/// Raw dot product
///
/// Not a metric: identical vectors do not score `0`. Useful with radius
/// bounds expressed as similarity bands. Negative scores add nothing to a
/// slot's eviction weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProduct;

impl Kernel for DotProduct {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    fn name(&self) -> &'static str {
        "dot"
    }
}

/// Cosine similarity
///
/// Zero-length inputs yield NaN, which never satisfies a radius bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Kernel for Cosine {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / na / nb
    }

    fn name(&self) -> &'static str {
        "cos"
    }
}

/// Wraps a closure as a kernel
pub struct FnKernel<F>(pub F);

impl<F> Kernel for FnKernel<F>
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        (self.0)(a, b)
    }
}

/// Look up a built-in kernel by its short name (`l2`, `dot`, `cos`)
pub fn kernel_by_name(name: &str) -> Option<Box<dyn Kernel>> {
    match name.to_lowercase().as_str() {
        "l2" | "euclidean" => Some(Box::new(Euclidean)),
        "dot" | "dot_product" => Some(Box::new(DotProduct)),
        "cos" | "cosine" => Some(Box::new(Cosine)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean() {
        let d = Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-6);
        assert_eq!(Euclidean.distance(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_euclidean_symmetric() {
        let a = [0.3, -1.2, 4.0];
        let b = [2.0, 0.5, -0.7];
        assert_eq!(Euclidean.distance(&a, &b), Euclidean.distance(&b, &a));
    }

    #[test]
    fn test_dot_and_cosine() {
        assert_eq!(DotProduct.distance(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
        let c = Cosine.distance(&[1.0, 0.0], &[2.0, 0.0]);
        assert!((c - 1.0).abs() < 1e-6);
        assert!(Cosine.distance(&[0.0, 0.0], &[1.0, 0.0]).is_nan());
    }

    #[test]
    fn test_fn_kernel() {
        let manhattan = FnKernel(|a: &[f32], b: &[f32]| {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
        });
        assert_eq!(manhattan.distance(&[0.0, 0.0], &[1.0, 2.0]), 3.0);
        assert_eq!(manhattan.name(), "custom");
    }

    #[test]
    fn test_kernel_by_name() {
        assert_eq!(kernel_by_name("L2").map(|k| k.name()), Some("l2"));
        assert_eq!(kernel_by_name("cos").map(|k| k.name()), Some("cos"));
        assert!(kernel_by_name("hamming").is_none());
    }
}
