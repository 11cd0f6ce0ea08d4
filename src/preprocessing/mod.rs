// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Signal preprocessing module
//!
//! This module handles preprocessing of captured recordings before spectral
//! analysis, currently causal Butterworth low-pass filtering.

pub mod filter;

pub use filter::{lowpass, ButterLowpassFilter, Filter, FilterError, DEFAULT_ORDER};

/// Create a Butterworth low-pass filter for the given sampling frequency
pub fn create_lowpass_filter(
    cutoff_hz: f64,
    sampling_frequency_hz: u32,
    order: usize,
) -> Result<Box<dyn Filter>, FilterError> {
    Ok(Box::new(ButterLowpassFilter::new(
        cutoff_hz,
        sampling_frequency_hz,
        order,
    )?))
}
