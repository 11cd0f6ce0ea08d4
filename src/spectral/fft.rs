// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! FFT implementation for spectral analysis

use rustfft::{num_complex::Complex64, FftPlanner};
use serde::{Deserialize, Serialize};

/// Trait for implementing spectral analysis
pub trait SpectralAnalyzer: Send + Sync {
    /// Analyze the given signal and extract its magnitude spectrum
    fn analyze(&self, signal: &[f64], sample_rate: u32) -> SpectrumResult;
}

/// Single-sided magnitude spectrum, DC bin excluded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResult {
    /// Magnitudes of bins `1..N/2`, scaled by `2/N`
    pub magnitudes: Vec<f64>,
    /// Centre frequency of each bin in Hz, strictly increasing
    pub frequencies_hz: Vec<f64>,
}

impl SpectrumResult {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Frequency and magnitude of the strongest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies_hz
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// The `count` strongest local maxima, strongest first
    pub fn peaks(&self, count: usize) -> Vec<(f64, f64)> {
        let m = &self.magnitudes;
        let mut peaks: Vec<(f64, f64)> = (0..m.len())
            .filter(|&i| {
                let left = i == 0 || m[i] > m[i - 1];
                let right = i + 1 == m.len() || m[i] >= m[i + 1];
                left && right && m[i] > 0.0
            })
            .map(|i| (self.frequencies_hz[i], m[i]))
            .collect();
        peaks.sort_by(|a, b| b.1.total_cmp(&a.1));
        peaks.truncate(count);
        peaks
    }

    /// Bins up to and including `max_hz`
    pub fn truncated(&self, max_hz: f64) -> SpectrumResult {
        let keep = self.frequencies_hz.partition_point(|&f| f <= max_hz);
        SpectrumResult {
            magnitudes: self.magnitudes[..keep].to_vec(),
            frequencies_hz: self.frequencies_hz[..keep].to_vec(),
        }
    }
}

/// FFT-based spectral analyzer
pub struct FFTAnalyzer {
    window_function: WindowFunction,
}

impl Default for FFTAnalyzer {
    fn default() -> Self {
        Self::new(WindowFunction::Hamming)
    }
}

impl FFTAnalyzer {
    /// Create a new FFT analyzer using the given window
    pub fn new(window_function: WindowFunction) -> Self {
        Self { window_function }
    }

    pub fn window_function(&self) -> WindowFunction {
        self.window_function
    }

    /// Remove the mean and apply the window function
    fn prepare(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        let mean = signal.iter().sum::<f64>() / n as f64;
        let last = (n - 1) as f64;

        signal
            .iter()
            .enumerate()
            .map(|(i, &sample)| (sample - mean) * self.window_function.coefficient(i, last))
            .collect()
    }

    /// Compute FFT of the prepared signal
    fn compute_fft(signal: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(buffer.len());
        fft.process(&mut buffer);
        buffer
    }

    /// Convert FFT output to a single-sided spectrum without the DC bin
    fn fft_to_spectrum(fft_output: &[Complex64], sample_rate: u32) -> SpectrumResult {
        let n = fft_output.len();
        let df = sample_rate as f64 / n as f64;
        let useful_bins = n / 2;

        let (frequencies_hz, magnitudes): (Vec<f64>, Vec<f64>) = (1..useful_bins)
            .map(|k| (k as f64 * df, fft_output[k].norm() * 2.0 / n as f64))
            .unzip();

        SpectrumResult {
            magnitudes,
            frequencies_hz,
        }
    }
}

impl SpectralAnalyzer for FFTAnalyzer {
    fn analyze(&self, signal: &[f64], sample_rate: u32) -> SpectrumResult {
        // Fewer than 3 samples leave no bin between DC and Nyquist
        if signal.len() <= 2 || sample_rate == 0 {
            return SpectrumResult::default();
        }

        let prepared = self.prepare(signal);
        let fft_result = Self::compute_fft(&prepared);
        Self::fft_to_spectrum(&fft_result, sample_rate)
    }
}

/// Available window functions for spectral analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    Rectangular,
    Hann,
    #[default]
    Hamming,
    Blackman,
}

impl WindowFunction {
    /// Symmetric window coefficient for sample `i` of a window spanning `0..=last`
    pub fn coefficient(&self, i: usize, last: f64) -> f64 {
        use std::f64::consts::PI;
        let x = i as f64 / last;
        match self {
            WindowFunction::Rectangular => 1.0,
            WindowFunction::Hann => 0.5 * (1.0 - (2.0 * PI * x).cos()),
            WindowFunction::Hamming => 0.54 - 0.46 * (2.0 * PI * x).cos(),
            WindowFunction::Blackman => {
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sine(freq: f64, fs: u32, n: usize, amplitude: f64, offset: f64) -> Vec<f64> {
        (0..n)
            .map(|i| offset + amplitude * (2.0 * PI * freq * i as f64 / fs as f64).sin())
            .collect()
    }

    #[test]
    fn test_hamming_coefficients() {
        let last = 7.0;
        assert_relative_eq!(WindowFunction::Hamming.coefficient(0, last), 0.08, epsilon = 1e-12);
        assert_relative_eq!(WindowFunction::Hamming.coefficient(7, last), 0.08, epsilon = 1e-12);
        assert_relative_eq!(
            WindowFunction::Hamming.coefficient(3, last),
            WindowFunction::Hamming.coefficient(4, last),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_lengths_and_frequencies() {
        let analyzer = FFTAnalyzer::default();
        let spectrum = analyzer.analyze(&sine(500.0, 8000, 256, 1.0, 0.0), 8000);
        assert_eq!(spectrum.len(), 127);
        assert_eq!(spectrum.frequencies_hz.len(), 127);
        assert_relative_eq!(spectrum.frequencies_hz[0], 31.25);
        assert_relative_eq!(spectrum.frequencies_hz[126], 127.0 * 31.25);
        assert!(spectrum.frequencies_hz.windows(2).all(|w| w[0] < w[1]));

        // Odd length: bins 1..N/2 with N/2 rounded down
        let spectrum = analyzer.analyze(&sine(500.0, 8000, 255, 1.0, 0.0), 8000);
        assert_eq!(spectrum.len(), 126);
    }

    #[test]
    fn test_tiny_inputs_give_empty_spectrum() {
        let analyzer = FFTAnalyzer::default();
        assert!(analyzer.analyze(&[], 8000).is_empty());
        assert!(analyzer.analyze(&[1.0], 8000).is_empty());
        assert!(analyzer.analyze(&[1.0, 2.0], 8000).is_empty());
        assert_eq!(analyzer.analyze(&[1.0, 2.0, 3.0], 8000).len(), 0);
        assert_eq!(analyzer.analyze(&[1.0, 2.0, 3.0, 4.0], 8000).len(), 1);
    }

    #[test]
    fn test_dc_offset_is_removed() {
        let analyzer = FFTAnalyzer::default();
        let spectrum = analyzer.analyze(&vec![512.0; 256], 8000);
        assert_eq!(spectrum.len(), 127);
        assert!(spectrum.magnitudes.iter().all(|&m| m.abs() < 1e-9));
    }

    #[test]
    fn test_sine_peak_location() {
        let analyzer = FFTAnalyzer::default();
        // 1000 Hz falls exactly on bin 32 for N=256 at 8 kHz
        let spectrum = analyzer.analyze(&sine(1000.0, 8000, 256, 100.0, 512.0), 8000);
        let (freq, magnitude) = spectrum.peak().unwrap();
        assert_relative_eq!(freq, 1000.0);
        // Hamming coherent gain is 0.54
        assert_relative_eq!(magnitude, 54.0, max_relative = 0.02);
        // Bin 0 is dropped, index k holds bin k + 1
        assert_relative_eq!(spectrum.magnitudes[31], magnitude);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let signal = sine(440.0, 8000, 1024, 3.0, 1.0);
        let analyzer = FFTAnalyzer::default();
        let first = analyzer.analyze(&signal, 8000);
        let second = analyzer.analyze(&signal, 8000);
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_and_peaks() {
        let mut signal = sine(500.0, 8000, 256, 10.0, 0.0);
        for (s, t) in signal.iter_mut().zip(sine(2000.0, 8000, 256, 5.0, 0.0)) {
            *s += t;
        }
        let analyzer = FFTAnalyzer::new(WindowFunction::Hann);
        let spectrum = analyzer.analyze(&signal, 8000);

        let peaks = spectrum.peaks(2);
        assert_eq!(peaks.len(), 2);
        assert_relative_eq!(peaks[0].0, 500.0);
        assert_relative_eq!(peaks[1].0, 2000.0);

        let low = spectrum.truncated(1000.0);
        assert_eq!(low.len(), 32);
        assert!(low.frequencies_hz.iter().all(|&f| f <= 1000.0));
        assert_relative_eq!(low.peak().unwrap().0, 500.0);
    }
}
