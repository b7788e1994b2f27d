//! Songs
//!
//! Turns decoded PCM into a song's feature vector and keeps it alongside the
//! song's tag info, so a collection of songs can be clustered directly.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::config::SpectralConfig;
use crate::decode::{DecodeError, SoxDecoder};
use crate::features::SpectralSummary;
use crate::matrix::FeatureMatrix;
use crate::spectrogram::{Spectrogram, SpectrogramBuilder, SpectrogramError};

/// Reasons a song could not be turned into features.
#[derive(Debug, Error)]
pub enum SongError {
    /// The audio could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The feature engine was misconfigured.
    #[error(transparent)]
    Spectrogram(#[from] SpectrogramError),
}

/// Convert raw unsigned 8-bit PCM to samples.
pub fn samples_from_u8(pcm: &[u8]) -> Vec<f64> {
    pcm.iter().map(|&b| f64::from(b)).collect()
}

/// Everything the spectral engine reports about one buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Summary statistics.
    pub summary: SpectralSummary,
    /// Energy per log-frequency bucket.
    pub log_freq: Vec<f64>,
    /// Number of frames analyzed.
    pub frames: usize,
}

impl Analysis {
    /// Fixed-order feature vector.
    pub fn feature_vector(&self) -> Vec<f64> {
        self.summary.feature_vector(&self.log_freq)
    }
}

/// Runs sample buffers through the spectral engine.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    builder: SpectrogramBuilder,
    sample_rate: u32,
}

impl FeatureExtractor {
    /// Extractor for `config`.
    ///
    /// Returns:
    /// - `Err(Configuration)` if `config.frame_size` and `config.overlap`
    ///   cannot frame a signal.
    pub fn new(config: &SpectralConfig) -> Result<Self, SpectrogramError> {
        let builder = SpectrogramBuilder::new()
            .frame_size(config.frame_size)
            .overlap(config.overlap);
        builder.hop()?;
        Ok(FeatureExtractor {
            builder,
            sample_rate: config.sample_rate,
        })
    }

    /// Sample rate the statistics are scaled to.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Spectral summary and log-frequency profile of `samples`.
    ///
    /// Returns:
    /// - `Err(Configuration)` only if the framing is invalid, which
    ///   [`FeatureExtractor::new`] already rejects.
    pub fn analyze(&self, samples: &[f64]) -> Result<Analysis, SpectrogramError> {
        let mut spectrogram: Spectrogram = self.builder.build(samples)?;
        let summary = spectrogram.stats(self.sample_rate);
        let log_freq = spectrogram.log_freq().map(<[f64]>::to_vec).unwrap_or_default();
        Ok(Analysis {
            summary,
            log_freq,
            frames: spectrogram.len(),
        })
    }

    /// Feature vector of `samples`.
    pub fn extract(&self, samples: &[f64]) -> Result<Vec<f64>, SpectrogramError> {
        Ok(self.analyze(samples)?.feature_vector())
    }

    /// Feature vectors of independent buffers, computed in parallel.
    /// Results keep the order of `buffers`.
    pub fn extract_batch<S>(&self, buffers: &[S]) -> Vec<Result<Vec<f64>, SpectrogramError>>
    where
        S: AsRef<[f64]> + Sync,
    {
        buffers
            .par_iter()
            .map(|samples| self.extract(samples.as_ref()))
            .collect()
    }
}

/// A song's features and tag info.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Song {
    /// Feature vector.
    pub features: Vec<f64>,
    /// Tag info such as `artist` and `title`.
    pub info: BTreeMap<String, String>,
}

impl Song {
    /// Song from raw unsigned 8-bit PCM.
    ///
    /// Returns:
    /// - `Err(SongError::Spectrogram)` if the extractor's framing is invalid.
    pub fn from_pcm(
        pcm: &[u8],
        info: BTreeMap<String, String>,
        extractor: &FeatureExtractor,
    ) -> Result<Song, SongError> {
        let features = extractor.extract(&samples_from_u8(pcm))?;
        Ok(Song { features, info })
    }

    /// Decode `path` and extract its features.
    ///
    /// Returns:
    /// - `Err(SongError::Decode)` if the transcoder cannot be run or fails;
    ///   callers skip the file.
    /// - `Err(SongError::Spectrogram)` if the extractor's framing is invalid.
    pub fn load(
        path: &Path,
        info: BTreeMap<String, String>,
        decoder: &SoxDecoder,
        extractor: &FeatureExtractor,
    ) -> Result<Song, SongError> {
        let pcm = decoder.decode(path)?;
        Song::from_pcm(&pcm, info, extractor)
    }

    /// Tag value for `key`, empty when absent.
    pub fn tag(&self, key: &str) -> &str {
        self.info.get(key).map_or("", String::as_str)
    }
}

impl Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}: {:?}",
            self.tag("artist"),
            self.tag("title"),
            self.features
        )
    }
}

impl FeatureMatrix for [Song] {
    fn rows(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> &[f64] {
        &self[index].features
    }

    fn row_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self[index].features
    }
}

impl FeatureMatrix for Vec<Song> {
    fn rows(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> &[f64] {
        &self[index].features
    }

    fn row_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self[index].features
    }
}
