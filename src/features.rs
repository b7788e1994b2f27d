//! Spectral statistics
//!
//! Reduces a [`Spectrogram`] to a handful of timbre descriptors and a
//! log-spaced energy profile, and assembles them into the fixed-order feature
//! vector consumed by the clustering engine.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::spectrogram::Spectrogram;
use crate::stats::OnlineStats;

/// Share of a frame's energy below the cutoff frequency.
const CUTOFF_ENERGY_FRACTION: f64 = 0.8;

/// Upper edges (Hz) of the log-frequency buckets; one more bucket collects
/// everything above the last edge.
pub const LOG_FREQ_THRESHOLDS: [f64; 10] = [
    100.0, 200.0, 300.0, 400.0, 600.0, 1000.0, 2000.0, 4000.0, 5000.0, 10000.0,
];

/// Number of entries in the log-frequency profile.
pub const LOG_FREQ_BUCKETS: usize = LOG_FREQ_THRESHOLDS.len() + 1;

/// Length of a song's feature vector.
pub const FEATURE_LEN: usize = 4 + LOG_FREQ_BUCKETS;

/// Summary statistics of one spectrogram.
///
/// A value that cannot be defined for the input (no frames, all-silent
/// frames, a single frame) is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectralSummary {
    /// Mean over frames of the frequency below which 80% of the frame's energy lies.
    pub cutoff_freq: f64,
    /// Mean frame energy divided by its standard deviation.
    #[serde(rename = "energyCV")]
    pub energy_cv: f64,
    /// Frequency of the bin whose magnitude varies most over time.
    pub max_var_freq: f64,
    /// Temporal variance of that bin.
    pub max_var_val: f64,
    /// Frequency of the bin with the largest mean magnitude.
    pub max_energy_freq: f64,
    /// Mean magnitude of that bin.
    pub max_energy_val: f64,
}

impl SpectralSummary {
    /// Named view of the summary, keyed `cutoffFreq`, `energyCV`,
    /// `maxVarFreq`, `maxVarVal`, `maxEnergyFreq` and `maxEnergyVal`.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("cutoffFreq", self.cutoff_freq),
            ("energyCV", self.energy_cv),
            ("maxVarFreq", self.max_var_freq),
            ("maxVarVal", self.max_var_val),
            ("maxEnergyFreq", self.max_energy_freq),
            ("maxEnergyVal", self.max_energy_val),
        ])
    }

    /// Feature vector
    /// `[cutoff_freq, energy_cv, max_var_freq, max_energy_freq, log_freq..]`.
    pub fn feature_vector(&self, log_freq: &[f64]) -> Vec<f64> {
        let mut features = Vec::with_capacity(4 + log_freq.len());
        features.extend_from_slice(&[
            self.cutoff_freq,
            self.energy_cv,
            self.max_var_freq,
            self.max_energy_freq,
        ]);
        features.extend_from_slice(log_freq);
        features
    }
}

impl Spectrogram {
    /// Compute spectral statistics for a signal sampled at `sample_rate` Hz.
    ///
    /// Also stores the log-frequency energy profile on the spectrogram,
    /// retrievable through [`Spectrogram::log_freq`].
    pub fn stats(&mut self, sample_rate: u32) -> SpectralSummary {
        let mut cutoff_freq = OnlineStats::new();
        let mut energy = OnlineStats::new();
        let mut bin_magnitudes = vec![OnlineStats::new(); self.bins()];

        for spectrum in self.spectra() {
            let mut total_energy = 0.0;
            for (stats, bin) in bin_magnitudes.iter_mut().zip(spectrum) {
                stats.add(bin.norm());
                total_energy += bin.norm_sqr();
            }
            energy.add(total_energy);

            // silent frames have no cutoff
            if total_energy > 0.0 {
                let threshold = total_energy * CUTOFF_ENERGY_FRACTION;
                let mut cumulative = 0.0;
                for (i, bin) in spectrum.iter().enumerate() {
                    cumulative += bin.norm_sqr();
                    if cumulative >= threshold {
                        cutoff_freq.add(self.frequency(i, sample_rate));
                        break;
                    }
                }
            }
        }

        // A bin seen in a single frame has no temporal spread.
        let freq_variances: OnlineStats = bin_magnitudes
            .iter()
            .map(|stats| stats.variance().unwrap_or(0.0))
            .collect();
        let freq_energies: OnlineStats = bin_magnitudes
            .iter()
            .map(|stats| stats.mean().unwrap_or(0.0))
            .collect();

        let (max_var_bin, max_var_val) = freq_variances.max().unwrap_or((0, f64::NAN));
        let (max_energy_bin, max_energy_val) = freq_energies.max().unwrap_or((0, f64::NAN));

        self.log_freq = Some(self.log_freq_energy(sample_rate));

        SpectralSummary {
            cutoff_freq: cutoff_freq.mean().unwrap_or(f64::NAN),
            energy_cv: energy.coefficient_of_variation().unwrap_or(f64::NAN),
            max_var_freq: self.frequency(max_var_bin, sample_rate),
            max_var_val,
            max_energy_freq: self.frequency(max_energy_bin, sample_rate),
            max_energy_val,
        }
    }

    /// Total frame energy per bucket of [`LOG_FREQ_THRESHOLDS`].
    ///
    /// The bucket cursor is driven by the frame index scaled as if it were a
    /// bin index, so frames fill buckets in time order. It advances at most
    /// one bucket per frame.
    fn log_freq_energy(&self, sample_rate: u32) -> Vec<f64> {
        let mut buckets = [OnlineStats::new(); LOG_FREQ_BUCKETS];
        let mut current = 0;
        for (i, spectrum) in self.spectra().iter().enumerate() {
            if current < LOG_FREQ_THRESHOLDS.len()
                && self.frequency(i, sample_rate) > LOG_FREQ_THRESHOLDS[current]
            {
                current += 1;
            }
            buckets[current].add(spectrum.iter().map(|bin| bin.norm_sqr()).sum());
        }
        buckets.iter().map(OnlineStats::sum).collect()
    }
}
