// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated source configuration
//!
//! When enabled, the serial port is replaced by a synthetic board that speaks
//! the same line protocol. Useful without hardware and for demonstrations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Use the simulated board instead of the serial port
    pub enabled: bool,

    /// Announced sampling frequency in Hz
    pub sampling_frequency_hz: u32,

    /// Announced block size in samples
    pub block_size: usize,

    /// Frequency of the generated tone in Hz
    pub tone_hz: f64,

    /// Peak amplitude of the tone, in ADC counts
    pub amplitude: f64,

    /// Constant offset added to every sample, in ADC counts
    pub offset: f64,

    /// Peak amplitude of the uniform noise, in ADC counts
    pub noise: f64,

    /// Seed of the noise generator; random when absent
    pub seed: Option<u64>,

    /// Pace blocks at the announced sampling rate
    pub realtime: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sampling_frequency_hz: 8000,
            block_size: 256,
            tone_hz: 440.0,
            amplitude: 200.0,
            offset: 512.0,
            noise: 20.0,
            seed: None,
            realtime: true,
        }
    }
}
