//! Dense row-major N×N storage for distances and edge masks.

/// Square matrix backed by one flat `Vec`
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix<T> {
    data: Vec<T>,
    n: usize,
}

impl<T: Copy> SquareMatrix<T> {
    pub fn filled(n: usize, value: T) -> Self {
        Self {
            data: vec![value; n * n],
            n,
        }
    }

    /// Build from flat row-major data. `None` if the length is not `n * n`.
    pub fn from_flat(n: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == n * n).then_some(Self { data, n })
    }

    /// Side length
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.data[i * self.n + j] = value;
    }

    /// Write `(i, j)` and `(j, i)` together
    #[inline]
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: T) {
        self.set(i, j, value);
        self.set(j, i, value);
    }

    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Set row `i` and column `i` to `value`
    pub fn fill_row_col(&mut self, i: usize, value: T) {
        for j in 0..self.n {
            self.set_symmetric(i, j, value);
        }
    }

    pub fn fill_diagonal(&mut self, value: T) {
        for i in 0..self.n {
            self.set(i, i, value);
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn as_flat(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_symmetric() {
        let mut m = SquareMatrix::filled(3, 0.0f32);
        m.set_symmetric(0, 2, 1.5);
        assert_eq!(m.get(0, 2), 1.5);
        assert_eq!(m.get(2, 0), 1.5);
        assert_eq!(m.get(1, 2), 0.0);
    }

    #[test]
    fn test_fill_row_col() {
        let mut m = SquareMatrix::filled(3, true);
        m.fill_row_col(1, false);
        assert_eq!(m.row(1), &[false, false, false]);
        assert!(!m.get(0, 1));
        assert!(!m.get(2, 1));
        assert!(m.get(0, 2));
    }

    #[test]
    fn test_from_flat_checks_len() {
        assert!(SquareMatrix::from_flat(2, vec![1u8; 4]).is_some());
        assert!(SquareMatrix::from_flat(2, vec![1u8; 3]).is_none());
    }
}
