//! K-means
//!
//! Clusters feature rows into `k` groups. Rows are min–max normalized, centers
//! start at random points of the normalized bounding box, and a fixed number
//! of assign/update rounds follows. A cluster left without members is
//! re-seeded at a fresh random point. Runs are ranked by a cost that scales
//! the reconstruction error by the sum of squared cluster sizes, which favors
//! balanced solutions over ones that collapse into few clusters.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::config::ClusterConfig;
use crate::distance::{Distance, SquaredEuclidean};
use crate::matrix::{normalize, Bounds, FeatureMatrix};

/// Errors returned by the clustering engine.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// An invalid argument was provided.
    #[error("invalid argument `{arg}`: {msg}")]
    InvalidArgument {
        /// The name of the invalid argument.
        arg: &'static str,
        /// A description of the problem.
        msg: String,
    },

    /// A row does not have the dimensionality of the first row.
    #[error("row {row} has {got} features, expected {expected}")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Dimensionality of the first row.
        expected: usize,
        /// Dimensionality of the offending row.
        got: usize,
    },
}

/// Outcome of one clustering run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    /// Owning cluster of every row, in row order.
    pub assignment: Vec<usize>,
    /// Reconstruction error times the sum of squared cluster sizes.
    pub cost: f64,
    /// Number of rows in each cluster.
    pub sizes: Vec<usize>,
    /// Final center of each cluster, in normalized coordinates.
    pub centers: Vec<Vec<f64>>,
}

impl Clustering {
    fn empty() -> Self {
        Clustering {
            assignment: Vec::new(),
            cost: 0.0,
            sizes: Vec::new(),
            centers: Vec::new(),
        }
    }
}

/// Builder for [`KMeans`].
#[derive(Debug, Clone)]
pub struct KMeansBuilder<D = SquaredEuclidean> {
    k: usize,
    iterations: usize,
    restarts: usize,
    distance: D,
}

impl KMeansBuilder {
    /// Start with default parameters:
    /// k = 8, iterations = 10, restarts = 10, squared Euclidean distance.
    pub fn new() -> Self {
        KMeansBuilder {
            k: 8,
            iterations: 10,
            restarts: 10,
            distance: SquaredEuclidean,
        }
    }
}

impl<D: Distance> KMeansBuilder<D> {
    /// Set the number of clusters.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the number of assign/update rounds per run.
    pub fn iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// Set how many independent runs [`KMeans::fit_best`] compares.
    pub fn restarts(mut self, n: usize) -> Self {
        self.restarts = n;
        self
    }

    /// Replace the distance function.
    pub fn distance<E: Distance>(self, distance: E) -> KMeansBuilder<E> {
        KMeansBuilder {
            k: self.k,
            iterations: self.iterations,
            restarts: self.restarts,
            distance,
        }
    }

    /// Finalize and create the engine.
    ///
    /// Returns:
    /// - `Err(InvalidArgument)` if `k`, `iterations` or `restarts` is 0.
    pub fn build(self) -> Result<KMeans<D>, ClusterError> {
        if self.k == 0 {
            return Err(ClusterError::InvalidArgument {
                arg: "k",
                msg: "must be >= 1".to_string(),
            });
        }
        if self.iterations == 0 {
            return Err(ClusterError::InvalidArgument {
                arg: "iterations",
                msg: "must be >= 1".to_string(),
            });
        }
        if self.restarts == 0 {
            return Err(ClusterError::InvalidArgument {
                arg: "restarts",
                msg: "must be >= 1".to_string(),
            });
        }
        Ok(KMeans {
            k: self.k,
            iterations: self.iterations,
            restarts: self.restarts,
            distance: self.distance,
        })
    }
}

impl Default for KMeansBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The clustering engine.
#[derive(Debug, Clone)]
pub struct KMeans<D = SquaredEuclidean> {
    k: usize,
    iterations: usize,
    restarts: usize,
    distance: D,
}

impl KMeans {
    /// Start customizing with a builder.
    pub fn builder() -> KMeansBuilder {
        KMeansBuilder::new()
    }

    /// Squared-Euclidean engine with the parameters of `config`.
    pub fn from_config(config: &ClusterConfig) -> Result<KMeans, ClusterError> {
        KMeansBuilder::new()
            .k(config.k)
            .iterations(config.iterations)
            .restarts(config.restarts)
            .build()
    }
}

impl<D: Distance> KMeans<D> {
    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Normalize `matrix` in place, then cluster it once.
    ///
    /// An empty matrix yields an empty assignment with cost 0.
    ///
    /// Returns:
    /// - `Err(InvalidArgument)` if `k` exceeds the number of rows.
    /// - `Err(RaggedRow)` if a row's length differs from the first row's.
    pub fn fit<M, R>(&self, matrix: &mut M, rng: &mut R) -> Result<Clustering, ClusterError>
    where
        M: FeatureMatrix + ?Sized,
        R: Rng + ?Sized,
    {
        if matrix.rows() == 0 {
            return Ok(Clustering::empty());
        }
        self.validate(matrix)?;
        normalize(matrix);
        Ok(self.run(matrix, rng))
    }

    /// Cluster an already normalized matrix once, without modifying it.
    ///
    /// Returns:
    /// - `Err(InvalidArgument)` if `k` exceeds the number of rows.
    /// - `Err(RaggedRow)` if a row's length differs from the first row's.
    pub fn fit_normalized<M, R>(&self, matrix: &M, rng: &mut R) -> Result<Clustering, ClusterError>
    where
        M: FeatureMatrix + ?Sized,
        R: Rng + ?Sized,
    {
        if matrix.rows() == 0 {
            return Ok(Clustering::empty());
        }
        self.validate(matrix)?;
        Ok(self.run(matrix, rng))
    }

    /// Normalize `matrix` in place once, then keep the cheapest of
    /// `restarts` independent runs.
    ///
    /// Runs execute in parallel, each with its own generator seeded from
    /// `rng`, so the result depends only on `rng` and not on scheduling. Ties
    /// go to the earliest run, and a NaN cost loses to any number.
    ///
    /// Returns:
    /// - `Err(InvalidArgument)` if `k` exceeds the number of rows.
    /// - `Err(RaggedRow)` if a row's length differs from the first row's.
    pub fn fit_best<M, R>(&self, matrix: &mut M, rng: &mut R) -> Result<Clustering, ClusterError>
    where
        M: FeatureMatrix + Sync + ?Sized,
        R: Rng + ?Sized,
        D: Sync,
    {
        if matrix.rows() == 0 {
            return Ok(Clustering::empty());
        }
        self.validate(matrix)?;
        normalize(matrix);

        let seeds: Vec<u64> = (0..self.restarts).map(|_| rng.gen()).collect();
        let shared: &M = matrix;
        let runs: Vec<Clustering> = seeds
            .par_iter()
            .map(|&seed| self.run(shared, &mut StdRng::seed_from_u64(seed)))
            .collect();

        match cheapest(runs) {
            Some((i, run)) => {
                log::info!(
                    "kept restart {i} of {} with cost {} (sizes {:?})",
                    self.restarts,
                    run.cost,
                    run.sizes
                );
                Ok(run)
            }
            None => Ok(Clustering::empty()),
        }
    }

    /// Index of the nearest center for every row.
    ///
    /// Ties go to the lowest center index. A row with no finite-distance
    /// center is placed in a uniformly random cluster.
    pub fn assign<M, R>(&self, matrix: &M, centers: &[Vec<f64>], rng: &mut R) -> Vec<usize>
    where
        M: FeatureMatrix + ?Sized,
        R: Rng + ?Sized,
    {
        let mut assignment = vec![0; matrix.rows()];
        self.assign_into(matrix, centers, &mut assignment, rng);
        assignment
    }

    fn assign_into<M, R>(
        &self,
        matrix: &M,
        centers: &[Vec<f64>],
        assignment: &mut [usize],
        rng: &mut R,
    ) where
        M: FeatureMatrix + ?Sized,
        R: Rng + ?Sized,
    {
        for (r, slot) in assignment.iter_mut().enumerate() {
            let point = matrix.row(r);
            let mut nearest = None;
            let mut best = f64::INFINITY;
            for (c, center) in centers.iter().enumerate() {
                let d = self.distance.distance(point, center);
                if d < best {
                    best = d;
                    nearest = Some(c);
                }
            }
            *slot = match nearest {
                Some(c) => c,
                None if !centers.is_empty() => {
                    log::warn!("row {r} has no nearest center, assigning at random");
                    rng.gen_range(0..centers.len())
                }
                None => 0,
            };
        }
    }

    fn validate<M: FeatureMatrix + ?Sized>(&self, matrix: &M) -> Result<(), ClusterError> {
        let rows = matrix.rows();
        if self.k > rows {
            return Err(ClusterError::InvalidArgument {
                arg: "k",
                msg: format!("{} clusters requested for {} rows", self.k, rows),
            });
        }
        let expected = matrix.dims();
        for row in 1..rows {
            let got = matrix.row(row).len();
            if got != expected {
                return Err(ClusterError::RaggedRow { row, expected, got });
            }
        }
        Ok(())
    }

    fn run<M, R>(&self, matrix: &M, rng: &mut R) -> Clustering
    where
        M: FeatureMatrix + ?Sized,
        R: Rng + ?Sized,
    {
        let rows = matrix.rows();
        let bounds = Bounds::of(matrix);

        let mut centers: Vec<Vec<f64>> = (0..self.k).map(|_| bounds.sample(rng)).collect();
        let mut assignment = vec![0; rows];
        let mut sizes = vec![0; self.k];

        for round in 0..self.iterations {
            self.assign_into(matrix, &centers, &mut assignment, rng);

            sizes.iter_mut().for_each(|s| *s = 0);
            centers.iter_mut().for_each(|c| c.iter_mut().for_each(|x| *x = 0.0));
            for (r, &c) in assignment.iter().enumerate() {
                sizes[c] += 1;
                for (acc, &x) in centers[c].iter_mut().zip(matrix.row(r)) {
                    *acc += x;
                }
            }

            for (c, center) in centers.iter_mut().enumerate() {
                if sizes[c] == 0 {
                    log::debug!("round {round}: cluster {c} is empty, reseeding");
                    *center = bounds.sample(rng);
                } else {
                    let n = sizes[c] as f64;
                    center.iter_mut().for_each(|x| *x /= n);
                }
            }
        }

        let error: f64 = assignment
            .iter()
            .enumerate()
            .map(|(r, &c)| self.distance.distance(matrix.row(r), &centers[c]))
            .sum();
        let cost = error * balance_penalty(&sizes);

        Clustering {
            assignment,
            cost,
            sizes,
            centers,
        }
    }
}

/// Index and run with the lowest cost. The earliest run wins ties, and a NaN
/// cost loses to any number.
fn cheapest<I>(runs: I) -> Option<(usize, Clustering)>
where
    I: IntoIterator<Item = Clustering>,
{
    let mut best: Option<(usize, Clustering)> = None;
    for (i, run) in runs.into_iter().enumerate() {
        log::debug!("restart {i}: cost {}", run.cost);
        let better = match &best {
            Some((_, b)) => run.cost < b.cost || (b.cost.is_nan() && !run.cost.is_nan()),
            None => true,
        };
        if better {
            best = Some((i, run));
        }
    }
    best
}

/// Sum of squared cluster sizes.
pub fn balance_penalty(sizes: &[usize]) -> f64 {
    sizes.iter().map(|&n| (n * n) as f64).sum()
}
