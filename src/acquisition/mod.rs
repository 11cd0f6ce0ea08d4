// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Signal acquisition module
//!
//! This module handles the acquisition of telemetry lines from the hardware link,
//! from the one-time configuration handshake to the continuous acquisition loop
//! that feeds the live-display and analysis channels.

use std::io;

pub mod daemon;
pub mod frame;
pub mod handshake;
mod mock;
pub mod recorder;
mod serial;
pub mod session;
pub mod stream;

pub use daemon::{AcquisitionCommand, AcquisitionDaemon, AcquisitionStats, CancelToken, StatsSnapshot};
pub use frame::{decode, DecodeError, Frame, FrameDecoder};
pub use handshake::{negotiate, ConfigError, LinkConfig};
pub use mock::{ScriptedLineSource, SimulatedLineSource};
pub use recorder::{
    recording_blocks, RecordingAssembler, RecordingError, MAX_RECORDING_SAMPLES,
};
pub use serial::{LineBuffer, SerialLineSource};
pub use session::AcquisitionSession;
pub use stream::{capped_channel, StreamReceiver, StreamSender};

/// Supplies text lines received from the hardware link
///
/// Implementations must never block indefinitely: when no complete line is
/// available within their own read timeout they return `Ok(None)`.
#[cfg_attr(test, mockall::automock)]
pub trait LineSource: Send {
    /// Read the next available line, without its line terminator
    ///
    /// Returns `Ok(None)` when no line is ready yet. Errors are transient link
    /// hiccups; callers are expected to log them and try again later.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }
}

/// Open the serial port described by the configuration
pub fn get_serial_line_source(
    config: &crate::config::SerialConfig,
) -> anyhow::Result<Box<dyn LineSource>> {
    Ok(Box::new(SerialLineSource::open(config)?))
}

/// Get a simulated line source that emits a synthetic tone
pub fn get_simulated_line_source(
    config: &crate::config::SimulationConfig,
) -> anyhow::Result<Box<dyn LineSource>> {
    Ok(Box::new(SimulatedLineSource::new(config)?))
}
