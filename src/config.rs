//! Configuration
//!
//! JSON-loadable parameters for feature extraction, decoding and clustering.

use std::fs;
use std::path::Path;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The contents are not a valid configuration.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MadcapConfig {
    /// Spectrogram and statistics parameters.
    pub spectral: SpectralConfig,
    /// Transcoder trim window.
    pub decode: DecodeConfig,
    /// Clustering parameters.
    pub clustering: ClusterConfig,
}

/// Spectrogram framing and sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Samples per frame.
    pub frame_size: usize,
    /// Fraction of a frame shared with the next one.
    pub overlap: f64,
    /// Sample rate of decoded audio, in Hz.
    pub sample_rate: u32,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            overlap: 0.75,
            sample_rate: 22_050,
        }
    }
}

/// Portion of each file handed to the feature engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Offset into the file, in seconds.
    pub start_secs: u32,
    /// Length of the excerpt, in seconds.
    pub length_secs: u32,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            start_secs: 0,
            length_secs: 4,
        }
    }
}

/// K-means parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of clusters.
    pub k: usize,
    /// Assign/update rounds per run.
    pub iterations: usize,
    /// Independent runs compared by cost.
    pub restarts: usize,
    /// Seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: 8,
            iterations: 10,
            restarts: 10,
            seed: None,
        }
    }
}

impl ClusterConfig {
    /// Random generator for clustering runs.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl MadcapConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    ///
    /// Returns:
    /// - `Err(Parse)` if `json` is malformed or a field has the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// Returns:
    /// - `Err(Io)` if the file cannot be read.
    /// - `Err(Parse)` if its contents are malformed.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load configuration from a JSON file, falling back to defaults when the
    /// file is missing or malformed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::read(&path) {
            Ok(config) => {
                log::info!("loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(err) => {
                log::warn!(
                    "could not load {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
