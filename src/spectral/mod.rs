// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Spectral analysis module
//!
//! This module handles spectral analysis of recordings,
//! particularly Fast Fourier Transform (FFT) processing.
//!
//! The analysis removes the mean, applies a symmetric Hamming window, and
//! returns the `2/N` scaled magnitudes of bins `1..N/2`. The DC bin is never
//! part of the result.

pub mod fft;

pub use fft::{FFTAnalyzer, SpectralAnalyzer, SpectrumResult, WindowFunction};

/// Magnitude spectrum of `samples` acquired at `sampling_frequency_hz`
///
/// Pure and deterministic. Inputs of two samples or fewer give an empty result.
pub fn analyze(samples: &[f64], sampling_frequency_hz: u32) -> SpectrumResult {
    FFTAnalyzer::default().analyze(samples, sampling_frequency_hz)
}

/// Create a new spectral analyzer with the given window function
pub fn create_spectral_analyzer(window_function: WindowFunction) -> Box<dyn SpectralAnalyzer> {
    Box::new(FFTAnalyzer::new(window_function))
}
