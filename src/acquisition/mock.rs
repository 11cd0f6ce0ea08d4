// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Synthetic line sources
//!
//! [`SimulatedLineSource`] behaves like a board running the acquisition
//! firmware: it announces its configuration, then streams a noisy tone as
//! paced `WAV:` blocks, each followed by the matching `FFT:` line.
//! [`ScriptedLineSource`] replays a fixed list of lines for tests and demos.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::handshake::CONFIG_MARKER;
use super::frame::{SPECTRUM_MARKER, WAVEFORM_MARKER};
use super::LineSource;
use crate::config::SimulationConfig;
use crate::spectral;

/// Simulated acquisition board emitting a sine tone plus uniform noise
pub struct SimulatedLineSource {
    sampling_frequency_hz: u32,
    block_size: usize,
    tone_hz: f64,
    amplitude: f64,
    offset: f64,
    noise: f64,
    rng: StdRng,
    /// Index of the next sample, keeps the tone phase continuous across blocks
    sample_index: u64,
    announced: bool,
    pending: VecDeque<String>,
    block_duration: Duration,
    next_block_at: Option<Instant>,
    realtime: bool,
}

impl SimulatedLineSource {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        if config.sampling_frequency_hz == 0 {
            bail!("Simulated sampling frequency must be greater than 0");
        }
        if config.block_size <= 1 {
            bail!("Simulated block size must be greater than 1");
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            sampling_frequency_hz: config.sampling_frequency_hz,
            block_size: config.block_size,
            tone_hz: config.tone_hz,
            amplitude: config.amplitude,
            offset: config.offset,
            noise: config.noise,
            rng,
            sample_index: 0,
            announced: false,
            pending: VecDeque::new(),
            block_duration: Duration::from_secs_f64(
                config.block_size as f64 / config.sampling_frequency_hz as f64,
            ),
            next_block_at: None,
            realtime: config.realtime,
        })
    }

    fn generate_block(&mut self) -> Vec<f64> {
        let fs = self.sampling_frequency_hz as f64;
        let mut samples = Vec::with_capacity(self.block_size);
        for _ in 0..self.block_size {
            let t = self.sample_index as f64 / fs;
            let noise = self.noise * (2.0 * self.rng.random::<f64>() - 1.0);
            samples.push(self.offset + self.amplitude * (2.0 * PI * self.tone_hz * t).sin() + noise);
            self.sample_index += 1;
        }
        samples
    }

    fn queue_block(&mut self) {
        let samples = self.generate_block();
        let spectrum = spectral::analyze(&samples, self.sampling_frequency_hz);
        self.pending
            .push_back(format!("{}{}", WAVEFORM_MARKER, join(&samples)));
        self.pending
            .push_back(format!("{}{}", SPECTRUM_MARKER, join(&spectrum.magnitudes)));
    }
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.4}", v))
        .collect::<Vec<_>>()
        .join(",")
}

impl LineSource for SimulatedLineSource {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        if !self.announced {
            self.announced = true;
            debug!("Simulated board announcing its configuration");
            return Ok(Some(format!(
                "{}{},{}",
                CONFIG_MARKER, self.sampling_frequency_hz, self.block_size
            )));
        }

        if let Some(line) = self.pending.pop_front() {
            return Ok(Some(line));
        }

        if self.realtime {
            let now = Instant::now();
            let due = *self.next_block_at.get_or_insert(now);
            if due > now {
                thread::sleep(due - now);
            }
            // Pace from the schedule, not from now, so the mean rate is exact
            self.next_block_at = Some(due + self.block_duration);
        }

        self.queue_block();
        Ok(self.pending.pop_front())
    }
}

/// Line source replaying a fixed script, then reporting no data forever
#[derive(Debug, Default)]
pub struct ScriptedLineSource {
    pub script: VecDeque<io::Result<Option<String>>>,
}

impl ScriptedLineSource {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: lines.into_iter().map(|l| Ok(Some(l.into()))).collect(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl LineSource for ScriptedLineSource {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.script.pop_front().unwrap_or(Ok(None))
    }
}
