//! Tests for spectrogram framing and spectral statistics.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use madcap::spectrogram::hamming_window;
use madcap::{Spectrogram, SpectrogramError, FEATURE_LEN, LOG_FREQ_BUCKETS};

const SAMPLE_RATE: u32 = 22_050;

const SUMMARY_KEYS: [&str; 6] = [
    "cutoffFreq",
    "energyCV",
    "maxVarFreq",
    "maxVarVal",
    "maxEnergyFreq",
    "maxEnergyVal",
];

/// A sine completing exactly `cycles` periods per `frame_size` samples.
fn bin_centered_sine(len: usize, frame_size: usize, cycles: usize) -> Vec<f64> {
    (0..len)
        .map(|n| (2.0 * PI * cycles as f64 * n as f64 / frame_size as f64).sin())
        .collect()
}

#[test]
fn frame_count_follows_hop() {
    let cases = [
        (2048, 1024, 0.75),
        (5000, 1024, 0.5),
        (1024, 1024, 0.0),
        (1023, 1024, 0.5),
        (3001, 256, 0.3),
        (100, 7, 0.9),
    ];
    for &(len, frame_size, overlap) in &cases {
        let hop = ((1.0 - overlap) * frame_size as f64).round() as usize;
        let expected = if len >= frame_size {
            (len - frame_size) / hop + 1
        } else {
            0
        };
        let spectrogram = Spectrogram::compute(&vec![1.0; len], frame_size, overlap).unwrap();
        assert_eq!(
            spectrogram.len(),
            expected,
            "len={len} frame_size={frame_size} overlap={overlap}"
        );
    }
}

#[test]
fn spectra_keep_lower_half() {
    for frame_size in [8, 15, 1024] {
        let spectrogram = Spectrogram::compute(&vec![0.5; 4096], frame_size, 0.5).unwrap();
        assert!(!spectrogram.is_empty());
        for spectrum in spectrogram.spectra() {
            assert_eq!(spectrum.len(), frame_size / 2);
        }
        assert_eq!(spectrogram.bins(), frame_size / 2);
    }
}

#[test]
fn short_buffer_yields_empty_spectrogram() {
    let mut spectrogram = Spectrogram::compute(&[1.0; 100], 1024, 0.75).unwrap();
    assert!(spectrogram.is_empty());
    assert_eq!(spectrogram.frequency(10, SAMPLE_RATE), 0.0);

    let summary = spectrogram.stats(SAMPLE_RATE);
    assert!(summary.cutoff_freq.is_nan());
    assert!(summary.energy_cv.is_nan());
    assert_eq!(summary.max_var_freq, 0.0);
    assert_eq!(summary.max_energy_freq, 0.0);
    assert_eq!(spectrogram.log_freq(), Some(&[0.0; LOG_FREQ_BUCKETS][..]));
}

#[test]
fn invalid_framing_is_rejected() {
    let samples = [0.0; 4096];
    assert!(matches!(
        Spectrogram::compute(&samples, 0, 0.5),
        Err(SpectrogramError::Configuration(_))
    ));
    assert!(matches!(
        Spectrogram::compute(&samples, 1024, 1.0),
        Err(SpectrogramError::Configuration(_))
    ));
    assert!(matches!(
        Spectrogram::compute(&samples, 1024, -0.1),
        Err(SpectrogramError::Configuration(_))
    ));
    assert!(matches!(
        Spectrogram::compute(&samples, 1024, f64::NAN),
        Err(SpectrogramError::Configuration(_))
    ));
    // rounds to a hop of zero samples
    assert!(matches!(
        Spectrogram::compute(&samples, 100, 0.999),
        Err(SpectrogramError::Configuration(_))
    ));
}

#[test]
fn frequency_maps_last_bin_to_nyquist() {
    let spectrogram = Spectrogram::compute(&[0.0; 2048], 1024, 0.75).unwrap();
    assert_relative_eq!(spectrogram.frequency(511, SAMPLE_RATE), 11_025.0);
    assert_relative_eq!(spectrogram.frequency(0, SAMPLE_RATE), 11_025.0 / 512.0);
}

#[test]
fn hamming_window_shape() {
    let w = hamming_window(1024);
    assert_eq!(w.len(), 1024);
    assert_relative_eq!(w[0], 0.08, epsilon = 1e-12);
    assert_relative_eq!(w[1023], 0.08, epsilon = 1e-12);
    for i in 0..512 {
        assert_relative_eq!(w[i], w[1023 - i], epsilon = 1e-12);
    }
    assert_eq!(hamming_window(1), vec![1.0]);
    assert!(hamming_window(0).is_empty());
}

#[test]
fn silent_input_has_undefined_cutoff_and_cv() {
    let mut spectrogram = Spectrogram::compute(&[0.0; 2048], 1024, 0.75).unwrap();
    assert_eq!(spectrogram.len(), 5);
    for spectrum in spectrogram.spectra() {
        assert!(spectrum.iter().all(|bin| bin.norm() == 0.0));
    }

    let summary = spectrogram.stats(SAMPLE_RATE);
    assert!(summary.cutoff_freq.is_nan());
    assert!(summary.energy_cv.is_nan());
    assert_eq!(summary.max_var_val, 0.0);
    assert_eq!(summary.max_energy_val, 0.0);
    assert_eq!(summary.max_energy_freq, spectrogram.frequency(0, SAMPLE_RATE));

    let log_freq = spectrogram.log_freq().unwrap();
    assert_eq!(log_freq.len(), LOG_FREQ_BUCKETS);
    assert!(log_freq.iter().all(|&e| e == 0.0));
}

#[test]
fn pure_tone_peaks_at_its_bin() {
    let mut spectrogram =
        Spectrogram::compute(&bin_centered_sine(2048, 1024, 64), 1024, 0.75).unwrap();
    let summary = spectrogram.stats(SAMPLE_RATE);

    let tone_freq = spectrogram.frequency(64, SAMPLE_RATE);
    assert_relative_eq!(summary.max_energy_freq, tone_freq);
    assert_relative_eq!(summary.cutoff_freq, tone_freq, max_relative = 1e-12);
    assert!(summary.max_energy_val > 0.0);
}

#[test]
fn log_freq_buckets_advance_with_frame_index() {
    // Frames 0..=3 map below 100 Hz and land in the first bucket; frame 4
    // crosses the first threshold.
    let mut spectrogram =
        Spectrogram::compute(&bin_centered_sine(2048, 1024, 64), 1024, 0.75).unwrap();
    spectrogram.stats(SAMPLE_RATE);

    let frame_energy: f64 = spectrogram.spectra()[0].iter().map(|b| b.norm_sqr()).sum();
    let log_freq = spectrogram.log_freq().unwrap();
    assert_relative_eq!(log_freq[0], 4.0 * frame_energy, max_relative = 1e-9);
    assert_relative_eq!(log_freq[1], frame_energy, max_relative = 1e-9);
    assert!(log_freq[2..].iter().all(|&e| e == 0.0));
}

#[test]
fn feature_vector_layout() {
    let samples: Vec<f64> = (0..8192)
        .map(|n| ((n * 7919) % 255) as f64 + 10.0 * (n as f64 * 0.01).sin())
        .collect();
    let mut spectrogram = Spectrogram::compute(&samples, 1024, 0.75).unwrap();
    let summary = spectrogram.stats(SAMPLE_RATE);
    let features = summary.feature_vector(spectrogram.log_freq().unwrap());

    assert_eq!(features.len(), FEATURE_LEN);
    assert_eq!(features[0].to_bits(), summary.cutoff_freq.to_bits());
    assert_eq!(features[1].to_bits(), summary.energy_cv.to_bits());
    assert_eq!(features[2].to_bits(), summary.max_var_freq.to_bits());
    assert_eq!(features[3].to_bits(), summary.max_energy_freq.to_bits());
    assert_eq!(&features[4..], spectrogram.log_freq().unwrap());

    let map = summary.to_map();
    assert_eq!(map.len(), SUMMARY_KEYS.len());
    for key in SUMMARY_KEYS {
        assert!(map.contains_key(key), "missing {key}");
    }
    assert_eq!(map["cutoffFreq"].to_bits(), summary.cutoff_freq.to_bits());
    assert_eq!(map["energyCV"].to_bits(), summary.energy_cv.to_bits());
    assert_eq!(map["maxVarFreq"].to_bits(), summary.max_var_freq.to_bits());
    assert_eq!(map["maxVarVal"].to_bits(), summary.max_var_val.to_bits());
    assert_eq!(map["maxEnergyFreq"].to_bits(), summary.max_energy_freq.to_bits());
    assert_eq!(map["maxEnergyVal"].to_bits(), summary.max_energy_val.to_bits());
}

#[test]
fn summary_serializes_with_map_keys() {
    let mut spectrogram =
        Spectrogram::compute(&bin_centered_sine(4096, 1024, 32), 1024, 0.5).unwrap();
    let summary = spectrogram.stats(SAMPLE_RATE);

    let value = serde_json::to_value(summary).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), SUMMARY_KEYS.len());
    for key in SUMMARY_KEYS {
        assert!(object.contains_key(key), "missing {key}");
    }
    let map = summary.to_map();
    assert_eq!(object["maxEnergyVal"].as_f64(), Some(map["maxEnergyVal"]));
}
