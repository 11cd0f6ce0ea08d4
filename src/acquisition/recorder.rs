// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Recording assembler
//!
//! Collects consecutive waveform blocks into a single [`Recording`] of a
//! requested duration. The assembler is owned by the acquisition loop; only
//! complete recordings ever leave it.

use log::{debug, info};
use thiserror::Error;

use super::LinkConfig;
use crate::recording::Recording;

/// Largest recording accepted, in samples (1 GiB of `f64`)
pub const MAX_RECORDING_SAMPLES: usize = 1 << 27;

/// Relative tolerance below which a sample count is taken as an integer
const SAMPLE_COUNT_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum RecordingError {
    #[error("invalid recording duration: {0} s")]
    InvalidDuration(f64),
    #[error("invalid recording length: {0} blocks")]
    InvalidBlockCount(usize),
    #[error("recording of {0} s exceeds the limit of {MAX_RECORDING_SAMPLES} samples")]
    TooLong(f64),
    #[error("acquisition session is no longer running")]
    SessionStopped,
}

#[derive(Debug)]
enum RecordingSession {
    Idle,
    Armed { collected: Vec<f64>, blocks: usize, target: usize },
}

/// Number of `link` blocks covering `duration_sec`, rounded up
///
/// The sample count is snapped to the nearest integer when float rounding
/// lands it just above one, so `0.07 s` at 200 Hz is 14 samples, not 15.
pub fn recording_blocks(link: LinkConfig, duration_sec: f64) -> Result<usize, RecordingError> {
    if !duration_sec.is_finite() || duration_sec <= 0.0 {
        return Err(RecordingError::InvalidDuration(duration_sec));
    }
    let exact = duration_sec * link.sampling_frequency_hz as f64;
    let nearest = exact.round();
    let samples = if (exact - nearest).abs() <= SAMPLE_COUNT_EPSILON * nearest.max(1.0) {
        nearest
    } else {
        exact.ceil()
    };
    if samples > MAX_RECORDING_SAMPLES as f64 {
        return Err(RecordingError::TooLong(duration_sec));
    }
    let blocks = (samples as usize).div_ceil(link.block_size).max(1);
    match blocks.checked_mul(link.block_size) {
        Some(total) if total <= MAX_RECORDING_SAMPLES => Ok(blocks),
        _ => Err(RecordingError::TooLong(duration_sec)),
    }
}

/// State machine turning waveform blocks into recordings
#[derive(Debug)]
pub struct RecordingAssembler {
    link: LinkConfig,
    session: RecordingSession,
}

impl RecordingAssembler {
    pub fn new(link: LinkConfig) -> Self {
        Self {
            link,
            session: RecordingSession::Idle,
        }
    }

    /// Number of blocks needed to cover `duration_sec`, rounded up
    pub fn blocks_for(&self, duration_sec: f64) -> Result<usize, RecordingError> {
        recording_blocks(self.link, duration_sec)
    }

    /// Start collecting a recording of at least `duration_sec` seconds
    ///
    /// Returns `Ok(false)` if a recording is already in progress; its progress
    /// is kept.
    pub fn arm(&mut self, duration_sec: f64) -> Result<bool, RecordingError> {
        let target = self.blocks_for(duration_sec)?;
        self.arm_blocks(target)
    }

    /// Start collecting a recording of exactly `target` blocks
    pub fn arm_blocks(&mut self, target: usize) -> Result<bool, RecordingError> {
        let within_limit = target
            .checked_mul(self.link.block_size)
            .is_some_and(|samples| samples <= MAX_RECORDING_SAMPLES);
        if target == 0 || !within_limit {
            return Err(RecordingError::InvalidBlockCount(target));
        }
        if let RecordingSession::Armed { blocks, target, .. } = &self.session {
            debug!(
                "Recording already in progress ({}/{} blocks), ignoring new request",
                blocks, target
            );
            return Ok(false);
        }

        info!(
            "Recording armed: {} blocks ({:.3} s at {} Hz)",
            target,
            target as f64 * self.link.block_duration_secs(),
            self.link.sampling_frequency_hz
        );
        self.session = RecordingSession::Armed {
            collected: Vec::with_capacity(self.link.block_size),
            blocks: 0,
            target,
        };
        Ok(true)
    }

    /// Feed one waveform block
    ///
    /// Returns the finished recording when this block completes the target.
    /// Blocks received while idle are ignored.
    pub fn on_waveform_frame(&mut self, samples: &[f64]) -> Option<Recording> {
        let RecordingSession::Armed {
            collected,
            blocks,
            target,
        } = &mut self.session
        else {
            return None;
        };

        collected.extend_from_slice(samples);
        *blocks += 1;
        if *blocks < *target {
            return None;
        }

        let samples = std::mem::take(collected);
        self.session = RecordingSession::Idle;
        let recording = Recording::new(samples, self.link.sampling_frequency_hz);
        info!(
            "Recording complete: {} samples ({:.3} s)",
            recording.samples.len(),
            recording.duration_secs()
        );
        Some(recording)
    }

    /// Drop any partial recording
    pub fn discard(&mut self) {
        if let RecordingSession::Armed { blocks, target, .. } = &self.session {
            info!("Discarding partial recording ({}/{} blocks)", blocks, target);
        }
        self.session = RecordingSession::Idle;
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.session, RecordingSession::Armed { .. })
    }

    /// `(collected, target)` blocks of the current recording, if any
    pub fn progress(&self) -> Option<(usize, usize)> {
        match &self.session {
            RecordingSession::Idle => None,
            RecordingSession::Armed { blocks, target, .. } => Some((*blocks, *target)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: usize, len: usize) -> Vec<f64> {
        (start..start + len).map(|v| v as f64).collect()
    }

    #[test]
    fn test_blocks_for_duration() {
        let assembler = RecordingAssembler::new(LinkConfig::new(8000, 256).unwrap());
        assert_eq!(assembler.blocks_for(1.0).unwrap(), 32);
        assert_eq!(assembler.blocks_for(3.0).unwrap(), 94);
        assert_eq!(assembler.blocks_for(0.001).unwrap(), 1);
        assert_eq!(
            assembler.blocks_for(0.0),
            Err(RecordingError::InvalidDuration(0.0))
        );
        assert!(assembler.blocks_for(-1.0).is_err());
        assert!(assembler.blocks_for(f64::NAN).is_err());
    }

    #[test]
    fn test_blocks_for_exact_multiples() {
        // 0.07 * 200 evaluates to 14.000000000000002
        let assembler = RecordingAssembler::new(LinkConfig::new(200, 2).unwrap());
        assert_eq!(assembler.blocks_for(0.07).unwrap(), 7);
        assert_eq!(assembler.blocks_for(0.075).unwrap(), 8);

        let assembler = RecordingAssembler::new(LinkConfig::new(1000, 100).unwrap());
        assert_eq!(assembler.blocks_for(1.1).unwrap(), 11);
        assert_eq!(assembler.blocks_for(1.1001).unwrap(), 12);

        let assembler = RecordingAssembler::new(LinkConfig::new(8000, 256).unwrap());
        assert_eq!(assembler.blocks_for(0.1).unwrap(), 4);
        assert_eq!(assembler.blocks_for(0.032).unwrap(), 1);
    }

    #[test]
    fn test_oversized_recordings_are_rejected() {
        let mut assembler = RecordingAssembler::new(LinkConfig::new(8000, 256).unwrap());
        assert_eq!(assembler.arm(1e6), Err(RecordingError::TooLong(1e6)));
        assert_eq!(assembler.arm(1e12), Err(RecordingError::TooLong(1e12)));
        assert_eq!(
            assembler.blocks_for(f64::MAX),
            Err(RecordingError::TooLong(f64::MAX))
        );
        assert_eq!(
            assembler.arm_blocks(usize::MAX),
            Err(RecordingError::InvalidBlockCount(usize::MAX))
        );
        assert!(!assembler.is_armed());

        // The limit itself is still accepted
        let limit_sec = MAX_RECORDING_SAMPLES as f64 / 8000.0;
        let blocks = assembler.blocks_for(limit_sec).unwrap();
        assert_eq!(blocks * 256, MAX_RECORDING_SAMPLES);
        assert!(assembler.arm(limit_sec).unwrap());
        assert_eq!(assembler.progress(), Some((0, blocks)));
    }

    #[test]
    fn test_collects_blocks_in_order() {
        let mut assembler = RecordingAssembler::new(LinkConfig::new(1000, 4).unwrap());
        assert!(assembler.arm_blocks(3).unwrap());

        assert!(assembler.on_waveform_frame(&block(0, 4)).is_none());
        assert!(assembler.on_waveform_frame(&block(4, 4)).is_none());
        assert_eq!(assembler.progress(), Some((2, 3)));
        let recording = assembler.on_waveform_frame(&block(8, 4)).unwrap();

        assert_eq!(recording.samples, block(0, 12));
        assert_eq!(recording.sampling_frequency_hz, 1000);
        assert!(!assembler.is_armed());
        assert!(assembler.on_waveform_frame(&block(12, 4)).is_none());
    }

    #[test]
    fn test_single_block_recording() {
        let mut assembler = RecordingAssembler::new(LinkConfig::new(1000, 4).unwrap());
        assembler.arm_blocks(1).unwrap();
        let recording = assembler.on_waveform_frame(&block(0, 4)).unwrap();
        assert_eq!(recording.samples.len(), 4);
    }

    #[test]
    fn test_idle_ignores_frames() {
        let mut assembler = RecordingAssembler::new(LinkConfig::new(1000, 4).unwrap());
        for i in 0..10 {
            assert!(assembler.on_waveform_frame(&block(i * 4, 4)).is_none());
        }
        assert_eq!(assembler.progress(), None);
    }

    #[test]
    fn test_rearm_while_armed_keeps_progress() {
        let mut assembler = RecordingAssembler::new(LinkConfig::new(1000, 4).unwrap());
        assert!(assembler.arm_blocks(2).unwrap());
        assert!(assembler.on_waveform_frame(&block(0, 4)).is_none());

        assert!(!assembler.arm_blocks(10).unwrap());
        assert!(!assembler.arm(5.0).unwrap());
        assert_eq!(assembler.progress(), Some((1, 2)));

        let recording = assembler.on_waveform_frame(&block(4, 4)).unwrap();
        assert_eq!(recording.samples, block(0, 8));
    }

    #[test]
    fn test_discard_drops_partial_recording() {
        let mut assembler = RecordingAssembler::new(LinkConfig::new(1000, 4).unwrap());
        assembler.arm_blocks(3).unwrap();
        assembler.on_waveform_frame(&block(0, 4));
        assembler.on_waveform_frame(&block(4, 4));
        assembler.discard();

        assert!(!assembler.is_armed());
        assert!(assembler.on_waveform_frame(&block(8, 4)).is_none());

        // A new session starts from scratch
        assembler.arm_blocks(1).unwrap();
        let recording = assembler.on_waveform_frame(&block(100, 4)).unwrap();
        assert_eq!(recording.samples, block(100, 4));
    }

    #[test]
    fn test_one_second_at_8khz() {
        let mut assembler = RecordingAssembler::new(LinkConfig::new(8000, 256).unwrap());
        assembler.arm(1.0).unwrap();
        let zeros = vec![0.0; 256];
        for _ in 0..31 {
            assert!(assembler.on_waveform_frame(&zeros).is_none());
        }
        let recording = assembler.on_waveform_frame(&zeros).unwrap();
        assert_eq!(recording.samples.len(), 8192);
        assert!(recording.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_arm_rejects_zero_blocks() {
        let mut assembler = RecordingAssembler::new(LinkConfig::new(1000, 4).unwrap());
        assert_eq!(
            assembler.arm_blocks(0),
            Err(RecordingError::InvalidBlockCount(0))
        );
        assert!(!assembler.is_armed());
    }
}
