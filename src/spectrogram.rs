//! Spectrogram
//!
//! Frames a waveform into overlapping Hamming-windowed slices and keeps the
//! non-redundant half of each frame's FFT.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};
use thiserror::Error;

/// Errors returned while configuring a spectrogram.
#[derive(Debug, Error)]
pub enum SpectrogramError {
    /// The frame size or overlap cannot produce a valid framing.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Builder for spectrogram framing parameters.
#[derive(Debug, Clone, Copy)]
pub struct SpectrogramBuilder {
    frame_size: usize,
    overlap: f64,
}

impl SpectrogramBuilder {
    /// Start with default parameters:
    /// frame_size = 1024, overlap = 0.75.
    pub fn new() -> Self {
        SpectrogramBuilder {
            frame_size: 1024,
            overlap: 0.75,
        }
    }

    /// Set the number of samples per frame (FFT length).
    pub fn frame_size(mut self, size: usize) -> Self {
        self.frame_size = size;
        self
    }

    /// Set the fraction of each frame shared with the next one, in `[0, 1)`.
    pub fn overlap(mut self, fraction: f64) -> Self {
        self.overlap = fraction;
        self
    }

    /// Sample advance between consecutive frame starts.
    ///
    /// Returns:
    /// - `Err(Configuration)` if `frame_size` is 0, `overlap` lies outside
    ///   `[0, 1)`, or the hop rounds to 0 samples.
    pub fn hop(&self) -> Result<usize, SpectrogramError> {
        if self.frame_size == 0 {
            return Err(SpectrogramError::Configuration(
                "frame_size cannot be zero".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(SpectrogramError::Configuration(format!(
                "overlap must lie in [0, 1), got {}",
                self.overlap
            )));
        }
        let hop = ((1.0 - self.overlap) * self.frame_size as f64).round() as usize;
        if hop == 0 {
            return Err(SpectrogramError::Configuration(format!(
                "overlap {} leaves no advance between frames of {} samples",
                self.overlap, self.frame_size
            )));
        }
        Ok(hop)
    }

    /// Compute the spectrogram of `samples`.
    ///
    /// Only frames lying entirely inside the buffer are transformed; a buffer
    /// shorter than one frame yields an empty spectrogram.
    ///
    /// Returns:
    /// - `Err(Configuration)` if `frame_size` is 0, `overlap` lies outside
    ///   `[0, 1)`, or the hop rounds to 0 samples.
    pub fn build(&self, samples: &[f64]) -> Result<Spectrogram, SpectrogramError> {
        let hop = self.hop()?;
        let frame_size = self.frame_size;

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(frame_size);
        let window = hamming_window(frame_size);
        let mut buffer = vec![Complex { re: 0.0, im: 0.0 }; frame_size];

        let mut spectra = Vec::new();
        let mut start = 0;
        while start + frame_size <= samples.len() {
            for ((slot, &s), &w) in buffer
                .iter_mut()
                .zip(&samples[start..start + frame_size])
                .zip(&window)
            {
                *slot = Complex { re: s * w, im: 0.0 };
            }
            fft.process(&mut buffer);
            spectra.push(buffer[..frame_size / 2].to_vec());
            start += hop;
        }

        log::debug!(
            "built spectrogram: {} frames of {} bins (frame_size={}, hop={})",
            spectra.len(),
            frame_size / 2,
            frame_size,
            hop
        );

        Ok(Spectrogram {
            spectra,
            log_freq: None,
        })
    }
}

impl Default for SpectrogramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Time-ordered half spectra of a real signal.
#[derive(Debug, Clone, Default)]
pub struct Spectrogram {
    spectra: Vec<Vec<Complex<f64>>>,
    pub(crate) log_freq: Option<Vec<f64>>,
}

impl Spectrogram {
    /// Start customizing with a builder.
    pub fn builder() -> SpectrogramBuilder {
        SpectrogramBuilder::new()
    }

    /// Build with the given frame size and overlap fraction.
    ///
    /// Returns:
    /// - `Err(Configuration)` if `frame_size` is 0, `overlap` lies outside
    ///   `[0, 1)`, or the hop rounds to 0 samples.
    pub fn compute(
        samples: &[f64],
        frame_size: usize,
        overlap: f64,
    ) -> Result<Spectrogram, SpectrogramError> {
        SpectrogramBuilder::new()
            .frame_size(frame_size)
            .overlap(overlap)
            .build(samples)
    }

    /// All spectra, one per frame.
    pub fn spectra(&self) -> &[Vec<Complex<f64>>] {
        &self.spectra
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// True when the input was shorter than one frame.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    /// Bins per spectrum, 0 for an empty spectrogram.
    pub fn bins(&self) -> usize {
        self.spectra.first().map_or(0, Vec::len)
    }

    /// Frequency in Hz of bin `index`, scaling so that the last bin maps to
    /// half of `sample_rate`. Returns 0 when there is nothing to scale against.
    pub fn frequency(&self, index: usize, sample_rate: u32) -> f64 {
        let bins = self.bins();
        if bins == 0 {
            return 0.0;
        }
        sample_rate as f64 / 2.0 * (index + 1) as f64 / bins as f64
    }

    /// Energy per log-spaced frequency bucket, available once
    /// [`Spectrogram::stats`] has run.
    pub fn log_freq(&self) -> Option<&[f64]> {
        self.log_freq.as_deref()
    }
}

/// Hamming window of length `len`.
pub fn hamming_window(len: usize) -> Vec<f64> {
    match len {
        0 => return Vec::new(),
        1 => return vec![1.0],
        _ => {}
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f64 / denom).cos())
        .collect()
}
