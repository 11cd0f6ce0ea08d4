// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Butterworth low-pass filter
//!
//! Coefficients come from the `sci-rs` port of SciPy's `butter`, so a filter
//! built here matches `scipy.signal.butter(order, cutoff, btype='low', fs=fs)`.

use log::debug;
use sci_rs::signal::filter::design::{butter_dyn, DigitalFilter, FilterBandType, FilterOutputType};

use super::{lfilter, Filter, FilterError};

/// Butterworth lowpass filter using sci-rs coefficients and causal filtering
///
/// ### Examples
///
/// ```no_run
/// use rust_serial_analyzer::preprocessing::filter::{ButterLowpassFilter, Filter};
///
/// let filter = ButterLowpassFilter::new(1000.0, 8000, 4).unwrap();
/// let input = vec![1.0, 0.5, -0.3, 0.8, -0.2];
/// let output = filter.apply(&input);
/// assert_eq!(output.len(), input.len());
/// ```
#[derive(Debug, Clone)]
pub struct ButterLowpassFilter {
    cutoff_hz: f64,
    sampling_frequency_hz: u32,
    order: usize,
    b: Vec<f64>,
    a: Vec<f64>,
}

impl ButterLowpassFilter {
    /// Design the filter, validating its parameters
    pub fn new(cutoff_hz: f64, sampling_frequency_hz: u32, order: usize) -> Result<Self, FilterError> {
        if sampling_frequency_hz == 0 {
            return Err(FilterError::InvalidSamplingFrequency(sampling_frequency_hz));
        }
        let nyquist_hz = sampling_frequency_hz as f64 / 2.0;
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || cutoff_hz >= nyquist_hz {
            return Err(FilterError::InvalidCutoff {
                cutoff_hz,
                nyquist_hz,
            });
        }
        if order == 0 {
            return Err(FilterError::InvalidOrder);
        }

        let (b, a) = Self::compute_coefficients(order, cutoff_hz / nyquist_hz)?;
        debug!(
            "Designed order {} Butterworth low-pass at {} Hz (fs={} Hz): b={:?} a={:?}",
            order, cutoff_hz, sampling_frequency_hz, b, a
        );

        Ok(Self {
            cutoff_hz,
            sampling_frequency_hz,
            order,
            b,
            a,
        })
    }

    fn compute_coefficients(order: usize, normalized_freq: f64) -> Result<(Vec<f64>, Vec<f64>), FilterError> {
        let filter = butter_dyn(
            order,
            vec![normalized_freq],
            Some(FilterBandType::Lowpass),
            Some(false),
            Some(FilterOutputType::Ba),
            None, // fs: already normalized to Nyquist
        );

        match filter {
            DigitalFilter::Ba(ba) => {
                let usable = !ba.b.is_empty()
                    && ba.a.first().is_some_and(|&a0| a0 != 0.0)
                    && ba.b.iter().chain(&ba.a).all(|c| c.is_finite());
                if usable {
                    Ok((ba.b, ba.a))
                } else {
                    Err(FilterError::Design)
                }
            }
            _ => Err(FilterError::Design),
        }
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    pub fn sampling_frequency_hz(&self) -> u32 {
        self.sampling_frequency_hz
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Transfer function coefficients `(b, a)`
    pub fn coefficients(&self) -> (&[f64], &[f64]) {
        (&self.b, &self.a)
    }
}

impl Filter for ButterLowpassFilter {
    fn apply(&self, signal: &[f64]) -> Vec<f64> {
        lfilter(&self.b, &self.a, signal)
    }
}
