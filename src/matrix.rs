//! Feature matrix
//!
//! Row-addressable numeric containers the clustering engine can work on, and
//! the in-place min–max normalization applied before clustering.

use rand::Rng;

/// A collection of equally sized feature rows.
pub trait FeatureMatrix {
    /// Number of rows.
    fn rows(&self) -> usize;

    /// Row `index`.
    fn row(&self, index: usize) -> &[f64];

    /// Mutable row `index`.
    fn row_mut(&mut self, index: usize) -> &mut [f64];

    /// Dimensionality, taken from the first row.
    fn dims(&self) -> usize {
        if self.rows() == 0 {
            0
        } else {
            self.row(0).len()
        }
    }
}

impl FeatureMatrix for [Vec<f64>] {
    fn rows(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> &[f64] {
        &self[index]
    }

    fn row_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self[index]
    }
}

impl FeatureMatrix for Vec<Vec<f64>> {
    fn rows(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> &[f64] {
        &self[index]
    }

    fn row_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self[index]
    }
}

/// Per-dimension value range of a matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl Bounds {
    /// Smallest and largest value of every column of `matrix`.
    ///
    /// NaN entries are ignored; a column without any number has the empty
    /// range `(+inf, -inf)`.
    pub fn of<M: FeatureMatrix + ?Sized>(matrix: &M) -> Bounds {
        let dims = matrix.dims();
        let mut min = vec![f64::INFINITY; dims];
        let mut max = vec![f64::NEG_INFINITY; dims];
        for r in 0..matrix.rows() {
            for (d, &x) in matrix.row(r).iter().enumerate().take(dims) {
                min[d] = min[d].min(x);
                max[d] = max[d].max(x);
            }
        }
        Bounds { min, max }
    }

    /// Column minima.
    pub fn min(&self) -> &[f64] {
        &self.min
    }

    /// Column maxima.
    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// A point drawn uniformly inside the box, one dimension at a time.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.min
            .iter()
            .zip(&self.max)
            .map(|(&lo, &hi)| {
                if lo < hi && (hi - lo).is_finite() {
                    rng.gen_range(lo..=hi)
                } else if lo.is_finite() {
                    lo
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Min–max scale every column of `matrix` into `[0, 1]`, in place.
///
/// A column with zero range becomes all zeros. NaN results are replaced by 0
/// and infinite results by 1.
pub fn normalize<M: FeatureMatrix + ?Sized>(matrix: &mut M) {
    let bounds = Bounds::of(matrix);
    for r in 0..matrix.rows() {
        let row = matrix.row_mut(r);
        for (d, x) in row.iter_mut().enumerate().take(bounds.min.len()) {
            let range = bounds.max[d] - bounds.min[d];
            let mut scaled = *x - bounds.min[d];
            if range != 0.0 {
                scaled /= range;
            }
            *x = if scaled.is_nan() {
                0.0
            } else if scaled.is_infinite() {
                1.0
            } else {
                scaled
            };
        }
    }
}
