// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Deferred analysis of a recording
//!
//! Runs the configured low-pass filter over a recording and computes the
//! spectrum of both the original and the filtered signal, so they can be
//! compared side by side.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::preprocessing::{ButterLowpassFilter, Filter, FilterError};
use crate::recording::Recording;
use crate::spectral::{create_spectral_analyzer, SpectrumResult};

/// Spectra of a recording before and after low-pass filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub sampling_frequency_hz: u32,
    pub sample_count: usize,
    pub cutoff_hz: f64,
    pub filter_order: usize,
    /// Spectrum of the raw recording
    pub original: SpectrumResult,
    /// Spectrum of the low-pass filtered recording
    pub filtered: SpectrumResult,
    /// Filtered samples, same length as the recording
    #[serde(skip)]
    pub filtered_samples: Vec<f64>,
}

impl AnalysisReport {
    /// Both spectra limited to `max_hz`
    pub fn truncated(&self, max_hz: f64) -> Self {
        Self {
            original: self.original.truncated(max_hz),
            filtered: self.filtered.truncated(max_hz),
            ..self.clone()
        }
    }

    /// Log the strongest peaks of both spectra
    pub fn log_summary(&self, peak_count: usize) {
        info!(
            "Analysis of {} samples at {} Hz (low-pass {} Hz, order {})",
            self.sample_count, self.sampling_frequency_hz, self.cutoff_hz, self.filter_order
        );
        for (label, spectrum) in [("original", &self.original), ("filtered", &self.filtered)] {
            let peaks = spectrum
                .peaks(peak_count)
                .iter()
                .map(|(f, m)| format!("{:.1} Hz ({:.3})", f, m))
                .collect::<Vec<_>>();
            if peaks.is_empty() {
                info!("  {}: no peak", label);
            } else {
                info!("  {}: {}", label, peaks.join(", "));
            }
        }
    }
}

/// Filter `recording` and compute the spectra described by `config`
pub fn analyze_recording(
    recording: &Recording,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, FilterError> {
    let filter = ButterLowpassFilter::new(
        config.cutoff_hz,
        recording.sampling_frequency_hz,
        config.filter_order,
    )?;
    let filtered_samples = filter.apply(&recording.samples);

    let analyzer = create_spectral_analyzer(config.window);
    let original = analyzer.analyze(&recording.samples, recording.sampling_frequency_hz);
    let filtered = analyzer.analyze(&filtered_samples, recording.sampling_frequency_hz);

    Ok(AnalysisReport {
        sampling_frequency_hz: recording.sampling_frequency_hz,
        sample_count: recording.len(),
        cutoff_hz: config.cutoff_hz,
        filter_order: config.filter_order,
        original,
        filtered,
        filtered_samples,
    })
}
