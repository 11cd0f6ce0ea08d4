// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Digital filters for signal preprocessing
//!
//! Filters are designed in transfer-function form (`b`, `a` coefficients) and
//! applied causally with a direct-form II transposed structure starting from a
//! zero state, the same semantics as SciPy's `lfilter`. No forward-backward
//! pass is made, so the output carries the filter's phase delay.
//!
//! # Examples
//!
//! ```no_run
//! use rust_serial_analyzer::preprocessing::filter::{lowpass, DEFAULT_ORDER};
//!
//! let samples = vec![512.0, 530.0, 498.0, 505.0, 520.0];
//! let filtered = lowpass(&samples, 8000, 1000.0, DEFAULT_ORDER).unwrap();
//! assert_eq!(filtered.len(), samples.len());
//! ```

pub mod butter;

use thiserror::Error;

pub use butter::ButterLowpassFilter;

/// Order used when none is configured
pub const DEFAULT_ORDER: usize = 4;

/// Trait for implementing digital filters
///
/// This trait provides a common interface for all digital filter implementations.
/// Filters are stateless between calls: each call to [`Filter::apply`] starts
/// from a zero state.
pub trait Filter: Send + Sync {
    /// Apply the filter to a signal and return the filtered signal
    fn apply(&self, signal: &[f64]) -> Vec<f64>;
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("invalid sampling frequency: {0} Hz")]
    InvalidSamplingFrequency(u32),
    #[error("cutoff frequency {cutoff_hz} Hz must be strictly between 0 and the Nyquist frequency {nyquist_hz} Hz")]
    InvalidCutoff { cutoff_hz: f64, nyquist_hz: f64 },
    #[error("filter order must be at least 1")]
    InvalidOrder,
    #[error("filter design produced unusable coefficients")]
    Design,
}

/// Low-pass filter `samples` acquired at `sampling_frequency_hz`
///
/// Designs an `order`-th order Butterworth low-pass with its -3 dB point at
/// `cutoff_hz` and applies it causally. The output has the same length as
/// the input.
pub fn lowpass(
    samples: &[f64],
    sampling_frequency_hz: u32,
    cutoff_hz: f64,
    order: usize,
) -> Result<Vec<f64>, FilterError> {
    let filter = ButterLowpassFilter::new(cutoff_hz, sampling_frequency_hz, order)?;
    Ok(filter.apply(samples))
}

/// Apply the IIR filter `b / a` to `input` from a zero initial state
///
/// Coefficients are normalised by `a[0]`, which must be non-zero. An empty
/// `a` is treated as `[1.0]`.
pub fn lfilter(b: &[f64], a: &[f64], input: &[f64]) -> Vec<f64> {
    let a0 = a.first().copied().unwrap_or(1.0);
    let n = b.len().max(a.len()).max(1);
    let coeff = |v: &[f64], i: usize| v.get(i).copied().unwrap_or(0.0) / a0;
    let b: Vec<f64> = (0..n).map(|i| coeff(b, i)).collect();
    let a: Vec<f64> = (0..n).map(|i| coeff(a, i)).collect();

    let mut z = vec![0.0; n.saturating_sub(1)];
    let mut output = Vec::with_capacity(input.len());

    for &x in input {
        let y = b[0] * x + z.first().copied().unwrap_or(0.0);
        for i in 0..z.len() {
            let next = z.get(i + 1).copied().unwrap_or(0.0);
            z[i] = b[i + 1] * x + next - a[i + 1] * y;
        }
        output.push(y);
    }

    output
}
