// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Acquisition daemon module
//!
//! This module provides the acquisition loop that continuously reads telemetry
//! lines from a [`LineSource`], publishes decoded frames to the live-display
//! stream and assembles recordings for the analysis stream. The loop runs on
//! its own thread and is stopped through a [`CancelToken`].

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

use super::{Frame, FrameDecoder, LineSource, LinkConfig, RecordingAssembler, StreamSender};
use crate::recording::Recording;

/// Cooperative cancellation flag shared between the consumer and the daemon
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the daemon to stop; idempotent
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Control requests sent from the consumer to the acquisition thread
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionCommand {
    /// Start collecting a recording of at least `duration_sec` seconds
    StartRecording { duration_sec: f64 },
    /// Drop the recording in progress, if any
    AbortRecording,
}

/// Diagnostic counters of the acquisition loop
///
/// Written only by the acquisition thread, read by anyone.
#[derive(Debug, Default)]
pub struct AcquisitionStats {
    lines_read: AtomicU64,
    waveform_frames: AtomicU64,
    spectrum_frames: AtomicU64,
    malformed_lines: AtomicU64,
    read_errors: AtomicU64,
    recordings_completed: AtomicU64,
    recordings_discarded: AtomicU64,
}

/// Point-in-time copy of [`AcquisitionStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub lines_read: u64,
    pub waveform_frames: u64,
    pub spectrum_frames: u64,
    pub malformed_lines: u64,
    pub read_errors: u64,
    pub recordings_completed: u64,
    pub recordings_discarded: u64,
}

impl AcquisitionStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            waveform_frames: self.waveform_frames.load(Ordering::Relaxed),
            spectrum_frames: self.spectrum_frames.load(Ordering::Relaxed),
            malformed_lines: self.malformed_lines.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            recordings_completed: self.recordings_completed.load(Ordering::Relaxed),
            recordings_discarded: self.recordings_discarded.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Acquisition daemon that continuously reads from a line source
/// and streams the decoded data to the consumer
pub struct AcquisitionDaemon {
    /// Telemetry source (serial port, simulation or script)
    source: Box<dyn LineSource>,
    decoder: FrameDecoder,
    assembler: RecordingAssembler,
    /// Live-display stream, every decoded frame
    live: StreamSender<Frame>,
    /// Analysis stream, completed recordings only
    recordings: StreamSender<Recording>,
    commands: Receiver<AcquisitionCommand>,
    cancel: CancelToken,
    stats: Arc<AcquisitionStats>,
    /// Sleep between polls when no line is available
    poll_interval: Duration,
}

impl AcquisitionDaemon {
    /// Create a new acquisition daemon
    ///
    /// ### Parameters
    /// * `source` - The line source to read from, already past the handshake
    /// * `link` - Link configuration obtained from the handshake
    /// * `live` - Stream receiving every decoded frame
    /// * `recordings` - Stream receiving completed recordings
    /// * `commands` - Control requests from the consumer
    /// * `cancel` - Token stopping the loop
    /// * `poll_interval` - Idle sleep when no line is ready
    pub fn new(
        source: Box<dyn LineSource>,
        link: LinkConfig,
        live: StreamSender<Frame>,
        recordings: StreamSender<Recording>,
        commands: Receiver<AcquisitionCommand>,
        cancel: CancelToken,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            decoder: FrameDecoder::new(link),
            assembler: RecordingAssembler::new(link),
            live,
            recordings,
            commands,
            cancel,
            stats: Arc::new(AcquisitionStats::default()),
            poll_interval,
        }
    }

    /// Shared diagnostic counters
    pub fn stats(&self) -> Arc<AcquisitionStats> {
        self.stats.clone()
    }

    /// Run the acquisition loop until the cancel token is set
    ///
    /// A recording in progress at cancellation is discarded.
    pub fn run(mut self) -> StatsSnapshot {
        info!(
            "Acquisition daemon started (Fs={} Hz, block size={}, poll interval={:?})",
            self.decoder.link().sampling_frequency_hz,
            self.decoder.link().block_size,
            self.poll_interval
        );

        while !self.cancel.is_cancelled() {
            self.apply_commands();

            match self.source.read_line() {
                Ok(Some(line)) => self.handle_line(&line),
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    let count = AcquisitionStats::bump(&self.stats.read_errors);
                    error!("Error reading from line source ({} so far): {}", count, e);
                    thread::sleep(self.poll_interval);
                }
            }
        }

        if self.assembler.is_armed() {
            self.assembler.discard();
            AcquisitionStats::bump(&self.stats.recordings_discarded);
        }

        let stats = self.stats.snapshot();
        info!(
            "Acquisition daemon stopped: {} lines, {} waveform / {} spectrum frames, {} malformed, {} recordings",
            stats.lines_read,
            stats.waveform_frames,
            stats.spectrum_frames,
            stats.malformed_lines,
            stats.recordings_completed
        );
        stats
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                AcquisitionCommand::StartRecording { duration_sec } => {
                    match self.assembler.arm(duration_sec) {
                        Ok(true) => {}
                        Ok(false) => warn!(
                            "Recording request ignored, a recording is already in progress"
                        ),
                        Err(e) => warn!("Recording request rejected: {}", e),
                    }
                }
                AcquisitionCommand::AbortRecording => {
                    if self.assembler.is_armed() {
                        self.assembler.discard();
                        AcquisitionStats::bump(&self.stats.recordings_discarded);
                    }
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        AcquisitionStats::bump(&self.stats.lines_read);

        let frame = match self.decoder.try_decode(line) {
            Ok(frame) => frame,
            Err(e) => {
                AcquisitionStats::bump(&self.stats.malformed_lines);
                trace!("Discarding line: {}", e);
                return;
            }
        };

        match &frame {
            Frame::Waveform(samples) => {
                let count = AcquisitionStats::bump(&self.stats.waveform_frames);
                if count % 100 == 0 {
                    debug!("Processed {} waveform frames", count);
                }
                if let Some(recording) = self.assembler.on_waveform_frame(samples) {
                    AcquisitionStats::bump(&self.stats.recordings_completed);
                    if !self.recordings.publish(recording) {
                        warn!("Analysis stream closed, recording lost");
                    }
                }
            }
            Frame::Spectrum(_) => {
                AcquisitionStats::bump(&self.stats.spectrum_frames);
            }
        }

        self.live.publish(frame);
    }
}
