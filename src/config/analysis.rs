// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Offline analysis configuration
//!
//! Settings applied to every completed recording: low-pass filtering before
//! the spectrum is computed, and the frequency range reported.

use serde::{Deserialize, Serialize};

use crate::preprocessing::DEFAULT_ORDER;
use crate::spectral::WindowFunction;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Low-pass cutoff frequency in Hz.
    ///
    /// Must be below the Nyquist frequency of the link.
    pub cutoff_hz: f64,

    /// Butterworth filter order
    pub filter_order: usize,

    /// Highest frequency in Hz reported in spectrum summaries
    pub display_max_hz: f64,

    /// Window applied before the FFT
    pub window: WindowFunction,

    /// Number of spectral peaks reported per recording
    pub peak_count: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: 1000.0,
            filter_order: DEFAULT_ORDER,
            display_max_hz: 1000.0,
            window: WindowFunction::Hamming,
            peak_count: 3,
        }
    }
}
