// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Link configuration handshake
//!
//! On startup the board announces its sampling parameters with a single
//! `CONFIG:<fs>,<block_size>` line. Nothing else can run before this
//! announcement has been received and validated.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use super::LineSource;

/// Marker introducing the configuration announcement
pub const CONFIG_MARKER: &str = "CONFIG:";

/// Sampling parameters announced by the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkConfig {
    /// Sampling frequency of the waveform blocks in Hz
    pub sampling_frequency_hz: u32,
    /// Number of samples per waveform block (always > 1)
    pub block_size: usize,
}

impl LinkConfig {
    /// Build a validated link configuration
    pub fn new(sampling_frequency_hz: u32, block_size: usize) -> Result<Self, ConfigError> {
        if sampling_frequency_hz == 0 {
            return Err(ConfigError::InvalidSamplingFrequency(0));
        }
        if block_size <= 1 {
            return Err(ConfigError::InvalidBlockSize(block_size as i64));
        }
        Ok(Self {
            sampling_frequency_hz,
            block_size,
        })
    }

    /// Expected number of values in a `WAV:` line
    pub fn waveform_len(&self) -> usize {
        self.block_size
    }

    /// Expected number of values in an `FFT:` line
    pub fn spectrum_len(&self) -> usize {
        (self.block_size / 2).saturating_sub(1)
    }

    /// Duration covered by one waveform block, in seconds
    pub fn block_duration_secs(&self) -> f64 {
        self.block_size as f64 / self.sampling_frequency_hz as f64
    }
}

/// Failure of the configuration handshake. Fatal to startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no CONFIG: announcement received after {0} attempts")]
    NoAnnouncement(usize),
    #[error("malformed configuration announcement: {0:?}")]
    Malformed(String),
    #[error("invalid sampling frequency: {0}")]
    InvalidSamplingFrequency(i64),
    #[error("invalid block size: {0} (must be greater than 1)")]
    InvalidBlockSize(i64),
}

/// Parse the payload of a `CONFIG:` line
///
/// The first two comma-separated fields are the sampling frequency and the
/// block size; any trailing fields are ignored.
pub fn parse_announcement(line: &str) -> Result<LinkConfig, ConfigError> {
    let payload = line
        .trim()
        .strip_prefix(CONFIG_MARKER)
        .ok_or_else(|| ConfigError::Malformed(line.to_string()))?;

    let mut fields = payload.split(',').map(str::trim);
    let (Some(fs), Some(block)) = (fields.next(), fields.next()) else {
        return Err(ConfigError::Malformed(line.to_string()));
    };
    let fs: i64 = fs
        .parse()
        .map_err(|_| ConfigError::Malformed(line.to_string()))?;
    let block: i64 = block
        .parse()
        .map_err(|_| ConfigError::Malformed(line.to_string()))?;

    if fs <= 0 || fs > u32::MAX as i64 {
        return Err(ConfigError::InvalidSamplingFrequency(fs));
    }
    if block <= 1 {
        return Err(ConfigError::InvalidBlockSize(block));
    }
    if fields.next().is_some() {
        debug!("Ignoring extra fields in configuration announcement: {}", line);
    }

    LinkConfig::new(fs as u32, block as usize)
}

/// Wait for the configuration announcement on `source`
///
/// At most `max_attempts` polls are made. A poll that yields no line sleeps for
/// `poll_delay` before the next one; lines that are not announcements and read
/// errors both consume an attempt.
pub fn negotiate<S: LineSource + ?Sized>(
    source: &mut S,
    max_attempts: usize,
    poll_delay: Duration,
) -> Result<LinkConfig, ConfigError> {
    info!("Waiting for configuration announcement ({} attempts)", max_attempts);

    for attempt in 1..=max_attempts {
        match source.read_line() {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.starts_with(CONFIG_MARKER) {
                    let link = parse_announcement(line)?;
                    info!(
                        "Configuration received: Fs={} Hz, block size={} samples",
                        link.sampling_frequency_hz, link.block_size
                    );
                    return Ok(link);
                }
                debug!("Handshake attempt {}: skipping line {:?}", attempt, line);
            }
            Ok(None) => {
                debug!("Handshake attempt {}: no line available", attempt);
                thread::sleep(poll_delay);
            }
            Err(e) => {
                warn!("Handshake attempt {}: read error: {}", attempt, e);
                thread::sleep(poll_delay);
            }
        }
    }

    Err(ConfigError::NoAnnouncement(max_attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::MockLineSource;
    use mockall::Sequence;
    use std::io;

    #[test]
    fn test_parse_announcement() {
        let link = parse_announcement("CONFIG:8000,256").unwrap();
        assert_eq!(link.sampling_frequency_hz, 8000);
        assert_eq!(link.block_size, 256);
        assert_eq!(link.spectrum_len(), 127);

        let link = parse_announcement(" CONFIG: 4000 , 128 ,extra\r").unwrap();
        assert_eq!(link, LinkConfig::new(4000, 128).unwrap());
    }

    #[test]
    fn test_parse_announcement_rejects_bad_values() {
        assert!(matches!(
            parse_announcement("CONFIG:abc,256"),
            Err(ConfigError::Malformed(_))
        ));
        assert!(matches!(
            parse_announcement("CONFIG:8000"),
            Err(ConfigError::Malformed(_))
        ));
        assert!(matches!(
            parse_announcement("CONFIG:0,256"),
            Err(ConfigError::InvalidSamplingFrequency(0))
        ));
        assert!(matches!(
            parse_announcement("CONFIG:8000,-4"),
            Err(ConfigError::InvalidBlockSize(-4))
        ));
        assert!(matches!(
            parse_announcement("CONFIG:8000,1"),
            Err(ConfigError::InvalidBlockSize(1))
        ));
    }

    #[test]
    fn test_negotiate_skips_noise_until_announcement() {
        let mut source = MockLineSource::new();
        let mut seq = Sequence::new();
        source
            .expect_read_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(None));
        source
            .expect_read_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some("WAV:1,2,3".to_string())));
        source
            .expect_read_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(io::Error::new(io::ErrorKind::Other, "glitch")));
        source
            .expect_read_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some("CONFIG:8000,256".to_string())));

        let link = negotiate(&mut source, 10, Duration::from_millis(1)).unwrap();
        assert_eq!(link, LinkConfig::new(8000, 256).unwrap());
    }

    #[test]
    fn test_negotiate_gives_up_after_max_attempts() {
        let mut source = MockLineSource::new();
        source
            .expect_read_line()
            .times(5)
            .returning(|| Ok(Some("hello".to_string())));

        let result = negotiate(&mut source, 5, Duration::from_millis(1));
        assert!(matches!(result, Err(ConfigError::NoAnnouncement(5))));
    }

    #[test]
    fn test_negotiate_fails_on_malformed_announcement() {
        let mut source = MockLineSource::new();
        source
            .expect_read_line()
            .times(1)
            .returning(|| Ok(Some("CONFIG:fast,256".to_string())));

        let result = negotiate(&mut source, 10, Duration::from_millis(1));
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }
}
