// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Consumer-side handle on a running acquisition
//!
//! [`AcquisitionSession`] spawns the [`AcquisitionDaemon`] on a dedicated
//! thread and exposes the control surface used by the application: recording
//! requests, cancellation and non-blocking polls of the live and analysis
//! streams.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::Sender;
use log::{info, Level};

use super::{
    capped_channel, negotiate, recording_blocks, AcquisitionCommand, AcquisitionDaemon,
    AcquisitionStats, CancelToken, Frame, LineSource, LinkConfig, RecordingError, StatsSnapshot,
    StreamReceiver,
};
use crate::config::{AcquisitionConfig, HandshakeConfig};
use crate::recording::Recording;

pub struct AcquisitionSession {
    link: LinkConfig,
    live: StreamReceiver<Frame>,
    recordings: StreamReceiver<Recording>,
    commands: Sender<AcquisitionCommand>,
    cancel: CancelToken,
    stats: Arc<AcquisitionStats>,
    handle: Option<JoinHandle<StatsSnapshot>>,
}

impl AcquisitionSession {
    /// Perform the handshake on `source`, then start acquiring from it
    pub fn connect(
        mut source: Box<dyn LineSource>,
        handshake: &HandshakeConfig,
        config: &AcquisitionConfig,
    ) -> Result<Self> {
        let link = negotiate(
            &mut source,
            handshake.max_attempts,
            Duration::from_millis(handshake.poll_delay_ms),
        )
        .context("Configuration handshake failed")?;
        Self::start(source, link, config)
    }

    /// Start acquiring from a source whose handshake has already completed
    pub fn start(
        source: Box<dyn LineSource>,
        link: LinkConfig,
        config: &AcquisitionConfig,
    ) -> Result<Self> {
        let (live_tx, live) = capped_channel(
            capacity(config.max_queued_frames),
            "Live frame",
            Level::Debug,
        );
        let (recordings_tx, recordings) = capped_channel(
            capacity(config.max_queued_recordings),
            "Recording",
            Level::Warn,
        );
        let (commands, command_rx) = crossbeam_channel::unbounded();
        let cancel = CancelToken::new();

        let daemon = AcquisitionDaemon::new(
            source,
            link,
            live_tx,
            recordings_tx,
            command_rx,
            cancel.clone(),
            Duration::from_millis(config.poll_interval_ms),
        );
        let stats = daemon.stats();

        let handle = thread::Builder::new()
            .name("acquisition".to_string())
            .spawn(move || daemon.run())
            .context("Failed to spawn acquisition thread")?;

        Ok(Self {
            link,
            live,
            recordings,
            commands,
            cancel,
            stats,
            handle: Some(handle),
        })
    }

    pub fn link(&self) -> LinkConfig {
        self.link
    }

    /// Ask the acquisition thread to record at least `duration_sec` seconds
    ///
    /// The request is ignored by the acquisition thread if a recording is
    /// already in progress.
    pub fn start_recording(&self, duration_sec: f64) -> Result<(), RecordingError> {
        recording_blocks(self.link, duration_sec)?;
        self.send(AcquisitionCommand::StartRecording { duration_sec })
    }

    /// Drop the recording in progress without emitting it
    pub fn abort_recording(&self) -> Result<(), RecordingError> {
        self.send(AcquisitionCommand::AbortRecording)
    }

    fn send(&self, command: AcquisitionCommand) -> Result<(), RecordingError> {
        if !self.is_running() {
            return Err(RecordingError::SessionStopped);
        }
        self.commands
            .send(command)
            .map_err(|_| RecordingError::SessionStopped)
    }

    /// Request the acquisition thread to stop; it exits within one poll interval
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            info!("Cancelling acquisition");
        }
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    pub fn try_next_frame(&self) -> Option<Frame> {
        self.live.try_take()
    }

    /// All frames queued since the last poll, oldest first
    pub fn drain_frames(&self) -> Vec<Frame> {
        self.live.drain()
    }

    pub fn try_next_recording(&self) -> Option<Recording> {
        self.recordings.try_take()
    }

    pub fn dropped_frames(&self) -> u64 {
        self.live.dropped()
    }

    pub fn dropped_recordings(&self) -> u64 {
        self.recordings.dropped()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Cancel the acquisition and wait for its thread to finish
    ///
    /// Recordings completed before cancellation remain available through
    /// [`Self::try_next_recording`] until the session is dropped.
    pub fn join(&mut self) -> Result<StatsSnapshot> {
        self.cancel();
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("Acquisition thread panicked")),
            None => Ok(self.stats.snapshot()),
        }
    }
}

impl Drop for AcquisitionSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A configured capacity of 0 means unbounded
fn capacity(max_queued: usize) -> Option<usize> {
    (max_queued > 0).then_some(max_queued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::ScriptedLineSource;

    fn config() -> AcquisitionConfig {
        AcquisitionConfig {
            poll_interval_ms: 1,
            ..AcquisitionConfig::default()
        }
    }

    #[test]
    fn test_connect_fails_without_announcement() {
        let source = ScriptedLineSource::from_lines(["hello", "WAV:1,2"]);
        let handshake = HandshakeConfig {
            max_attempts: 4,
            poll_delay_ms: 1,
        };
        assert!(AcquisitionSession::connect(Box::new(source), &handshake, &config()).is_err());
    }

    #[test]
    fn test_start_recording_rejects_bad_duration() {
        let link = LinkConfig::new(1000, 4).unwrap();
        let mut session =
            AcquisitionSession::start(Box::new(ScriptedLineSource::default()), link, &config())
                .unwrap();
        assert_eq!(
            session.start_recording(-1.0),
            Err(RecordingError::InvalidDuration(-1.0))
        );
        assert!(session.start_recording(0.5).is_ok());

        session.join().unwrap();
        assert!(!session.is_running());
        assert_eq!(
            session.start_recording(0.5),
            Err(RecordingError::SessionStopped)
        );
    }

    #[test]
    fn test_start_recording_rejects_oversized_duration() {
        let link = LinkConfig::new(8000, 256).unwrap();
        let mut session =
            AcquisitionSession::start(Box::new(ScriptedLineSource::default()), link, &config())
                .unwrap();
        assert_eq!(
            session.start_recording(1e6),
            Err(RecordingError::TooLong(1e6))
        );
        assert_eq!(
            session.start_recording(1e12),
            Err(RecordingError::TooLong(1e12))
        );
        assert!(session.is_running());
        assert!(session.start_recording(1.0).is_ok());
        session.join().unwrap();
    }

    #[test]
    fn test_capacity_zero_is_unbounded() {
        assert_eq!(capacity(0), None);
        assert_eq!(capacity(4), Some(4));
    }
}
