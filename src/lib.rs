//! # madcap
//!
//! Spectral-timbre fingerprints for songs, and a balance-aware k-means to
//! group songs that sound alike.
//!
//! ## Example
//! ```rust
//! use madcap::{FeatureExtractor, KMeans, SpectralConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1) Extract one feature vector per song
//!     let extractor = FeatureExtractor::new(&SpectralConfig::default())?;
//!     let songs: Vec<Vec<f64>> = (1..=4)
//!         .map(|tone| {
//!             (0..8192)
//!                 .map(|i| 128.0 + 100.0 * (i as f64 * 0.05 * tone as f64).sin())
//!                 .collect()
//!         })
//!         .collect();
//!     let mut matrix = Vec::new();
//!     for samples in &songs {
//!         matrix.push(extractor.extract(samples)?);
//!     }
//!
//!     // 2) Cluster them, keeping the best of several runs
//!     let kmeans = KMeans::builder().k(2).restarts(4).build()?;
//!     let mut rng = StdRng::seed_from_u64(7);
//!     let clustering = kmeans.fit_best(&mut matrix, &mut rng)?;
//!     println!("{:?} (cost {:.3})", clustering.assignment, clustering.cost);
//!
//!     Ok(())
//! }
//! # run().unwrap();
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

/// Running mean, variance and maximum.
pub use stats::OnlineStats;

/// Windowed FFT framing.
pub use spectrogram::{Spectrogram, SpectrogramBuilder, SpectrogramError};

/// Spectral statistics and feature vectors.
pub use features::{SpectralSummary, FEATURE_LEN, LOG_FREQ_BUCKETS, LOG_FREQ_THRESHOLDS};

/// Pluggable distance functions.
pub use distance::{Distance, SquaredEuclidean};

/// Clusterable containers.
pub use matrix::{normalize, Bounds, FeatureMatrix};

/// Clustering engine.
pub use kmeans::{ClusterError, Clustering, KMeans, KMeansBuilder};

/// Transcoder boundary.
pub use decode::{DecodeError, SoxDecoder};

/// Songs and the per-song feature pipeline.
pub use song::{samples_from_u8, Analysis, FeatureExtractor, Song, SongError};

/// Configuration.
pub use config::{ClusterConfig, ConfigError, DecodeConfig, MadcapConfig, SpectralConfig};

/// Online statistics module.
pub mod stats;

/// Spectrogram module.
pub mod spectrogram;

/// Spectral statistics module.
pub mod features;

/// Distance module.
pub mod distance;

/// Feature matrix module.
pub mod matrix;

/// K-means module.
pub mod kmeans;

/// Decoding module.
pub mod decode;

/// Song module.
pub mod song;

/// Configuration module.
pub mod config;
