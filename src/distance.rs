//! Distance
//!
//! Pluggable dissimilarity between two feature vectors.

/// A non-negative dissimilarity score between two vectors.
pub trait Distance {
    /// Dissimilarity of `a` and `b`.
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;
}

/// Squared Euclidean distance over the shorter of the two vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredEuclidean;

impl Distance for SquaredEuclidean {
    #[inline]
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }
}

impl<F> Distance for F
where
    F: Fn(&[f64], &[f64]) -> f64,
{
    #[inline]
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        self(a, b)
    }
}
