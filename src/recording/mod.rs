// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Captured recordings
//!
//! A [`Recording`] is a contiguous run of waveform samples assembled from
//! consecutive blocks, together with the sampling frequency it was acquired at.
//! Recordings are immutable once produced; the [`snapshot`] module persists them.

pub mod snapshot;

use serde::{Deserialize, Serialize};

pub use snapshot::{export_wav, load_recording, save_recording};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Samples in acquisition order
    pub samples: Vec<f64>,
    /// Sampling frequency in Hz
    pub sampling_frequency_hz: u32,
}

impl Recording {
    pub fn new(samples: Vec<f64>, sampling_frequency_hz: u32) -> Self {
        Self {
            samples,
            sampling_frequency_hz,
        }
    }

    /// Duration covered by the samples, in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sampling_frequency_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sampling_frequency_hz as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copy of this recording with other samples, same sampling frequency
    pub fn with_samples(&self, samples: Vec<f64>) -> Self {
        Self::new(samples, self.sampling_frequency_hz)
    }
}
