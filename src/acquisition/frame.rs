// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Telemetry frame decoding
//!
//! Two kinds of payload travel on the link after the handshake:
//!
//! - `WAV:<v1>,...,<vN>`: one raw waveform block of `block_size` samples
//! - `FFT:<v1>,...,<vM>`: a spectrum computed on the board, `block_size / 2 - 1` bins
//!
//! Malformed lines are expected noise on a streaming link. They are rejected
//! without raising, and the reason is only kept for diagnostics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::LinkConfig;

/// Marker introducing a waveform block
pub const WAVEFORM_MARKER: &str = "WAV:";
/// Marker introducing a spectrum block
pub const SPECTRUM_MARKER: &str = "FFT:";

/// One decoded unit of telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    /// Raw waveform block, `block_size` samples
    Waveform(Vec<f64>),
    /// Magnitude spectrum computed by the board, `block_size / 2 - 1` bins
    Spectrum(Vec<f64>),
}

impl Frame {
    /// Values carried by the frame
    pub fn values(&self) -> &[f64] {
        match self {
            Frame::Waveform(samples) => samples,
            Frame::Spectrum(magnitudes) => magnitudes,
        }
    }

    /// Short name of the frame kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Waveform(_) => "waveform",
            Frame::Spectrum(_) => "spectrum",
        }
    }
}

/// Reason a line did not produce a frame
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The line carries neither marker; not a frame at all
    #[error("unrecognized line")]
    UnrecognizedLine,
    /// A value could not be parsed as a finite float
    #[error("invalid value {value:?} at position {position}")]
    InvalidValue { position: usize, value: String },
    /// The number of values does not match the link configuration
    #[error("{kind} frame has {actual} values, expected {expected}")]
    LengthMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Decodes raw lines into frames for a given link configuration
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    link: LinkConfig,
}

impl FrameDecoder {
    pub fn new(link: LinkConfig) -> Self {
        Self { link }
    }

    pub fn link(&self) -> LinkConfig {
        self.link
    }

    /// Decode a line, discarding it silently if it is not a valid frame
    pub fn decode(&self, raw_line: &str) -> Option<Frame> {
        self.try_decode(raw_line).ok()
    }

    /// Decode a line, reporting why it was rejected
    pub fn try_decode(&self, raw_line: &str) -> Result<Frame, DecodeError> {
        let line = raw_line.trim();

        if let Some(payload) = line.strip_prefix(WAVEFORM_MARKER) {
            let samples = parse_values(payload)?;
            check_len("waveform", self.link.waveform_len(), samples.len())?;
            Ok(Frame::Waveform(samples))
        } else if let Some(payload) = line.strip_prefix(SPECTRUM_MARKER) {
            let magnitudes = parse_values(payload)?;
            check_len("spectrum", self.link.spectrum_len(), magnitudes.len())?;
            Ok(Frame::Spectrum(magnitudes))
        } else {
            Err(DecodeError::UnrecognizedLine)
        }
    }
}

/// Decode `raw_line` against `link`; `None` if it is not a valid frame
pub fn decode(raw_line: &str, link: &LinkConfig) -> Option<Frame> {
    FrameDecoder::new(*link).decode(raw_line)
}

/// An empty payload carries zero values
fn parse_values(payload: &str) -> Result<Vec<f64>, DecodeError> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    payload
        .split(',')
        .enumerate()
        .map(|(position, raw)| {
            let value = raw.trim();
            match value.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(DecodeError::InvalidValue {
                    position,
                    value: value.to_string(),
                }),
            }
        })
        .collect()
}

fn check_len(kind: &'static str, expected: usize, actual: usize) -> Result<(), DecodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DecodeError::LengthMismatch {
            kind,
            expected,
            actual,
        })
    }
}
