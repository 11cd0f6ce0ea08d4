// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial port line source

use std::io::{self, Read};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serialport::SerialPort;

use super::LineSource;
use crate::config::SerialConfig;

/// Longest line accepted before the buffer is flushed as garbage
const MAX_LINE_BYTES: usize = 1 << 20;

/// Splits a byte stream into text lines
///
/// Lines end with `\n`; a trailing `\r` is stripped and invalid UTF-8 is
/// replaced. A partial line longer than the limit is dropped.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    max_line_bytes: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            pending: Vec::with_capacity(8192),
            max_line_bytes,
        }
    }

    /// Append received bytes
    ///
    /// Returns the number of bytes flushed if no line terminator was seen
    /// within the limit.
    pub fn push(&mut self, bytes: &[u8]) -> Option<usize> {
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > self.max_line_bytes && !self.pending.contains(&b'\n') {
            let flushed = self.pending.len();
            self.pending.clear();
            return Some(flushed);
        }
        None
    }

    /// Next complete line, without its terminator
    pub fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        let line = String::from_utf8_lossy(&raw);
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Bytes of the incomplete line waiting for its terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Line source reading from a serial port
pub struct SerialLineSource {
    port: Box<dyn SerialPort>,
    lines: LineBuffer,
    chunk: [u8; 1024],
}

impl SerialLineSource {
    /// Open the port and wait for the board to settle
    ///
    /// Opening the port resets most development boards, so nothing sent during
    /// `settle_delay_ms` is meaningful.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .with_context(|| format!("Failed to open serial port {}", config.port))?;
        info!(
            "Serial port opened: {} @ {} baud",
            config.port, config.baud_rate
        );

        if config.settle_delay_ms > 0 {
            debug!("Waiting {} ms for the board to settle", config.settle_delay_ms);
            thread::sleep(Duration::from_millis(config.settle_delay_ms));
        }
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            warn!("Could not clear serial input buffer: {}", e);
        }

        Ok(Self {
            port,
            lines: LineBuffer::default(),
            chunk: [0u8; 1024],
        })
    }
}

impl LineSource for SerialLineSource {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.lines.take_line() {
            return Ok(Some(line));
        }

        let n = match self.port.read(&mut self.chunk) {
            Ok(0) => return Ok(None),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
            Err(e) => return Err(e),
        };
        if let Some(flushed) = self.lines.push(&self.chunk[..n]) {
            warn!(
                "No line terminator in {} bytes, flushing serial buffer",
                flushed
            );
        }

        Ok(self.lines.take_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_crlf_and_lf() {
        let mut lines = LineBuffer::default();
        assert_eq!(lines.push(b"CONFIG:8000,256\r\nWAV:1,2\nFFT:0.5\r\n"), None);
        assert_eq!(lines.take_line().as_deref(), Some("CONFIG:8000,256"));
        assert_eq!(lines.take_line().as_deref(), Some("WAV:1,2"));
        assert_eq!(lines.take_line().as_deref(), Some("FFT:0.5"));
        assert_eq!(lines.take_line(), None);
        assert_eq!(lines.pending_len(), 0);
    }

    #[test]
    fn test_partial_line_spans_reads() {
        let mut lines = LineBuffer::default();
        lines.push(b"WAV:1,");
        assert_eq!(lines.take_line(), None);
        lines.push(b"2,3\r");
        assert_eq!(lines.take_line(), None);
        lines.push(b"\nWAV:4");
        assert_eq!(lines.take_line().as_deref(), Some("WAV:1,2,3"));
        assert_eq!(lines.take_line(), None);
        assert_eq!(lines.pending_len(), "WAV:4".len());
    }

    #[test]
    fn test_empty_and_invalid_utf8_lines() {
        let mut lines = LineBuffer::default();
        lines.push(b"\r\n\n\xffok\n");
        assert_eq!(lines.take_line().as_deref(), Some(""));
        assert_eq!(lines.take_line().as_deref(), Some(""));
        assert_eq!(lines.take_line().as_deref(), Some("\u{fffd}ok"));
    }

    #[test]
    fn test_runaway_line_is_flushed() {
        let mut lines = LineBuffer::new(8);
        assert_eq!(lines.push(b"WAV:1,2,"), None);
        assert_eq!(lines.push(b"3,4"), Some(11));
        assert_eq!(lines.pending_len(), 0);

        // Framing resumes with the next terminated line
        lines.push(b"FFT:1\n");
        assert_eq!(lines.take_line().as_deref(), Some("FFT:1"));
    }

    #[test]
    fn test_long_chunk_with_terminator_is_kept() {
        let mut lines = LineBuffer::new(8);
        assert_eq!(lines.push(b"WAV:1,2,3,4\nWAV:5"), None);
        assert_eq!(lines.take_line().as_deref(), Some("WAV:1,2,3,4"));
        assert_eq!(lines.pending_len(), 5);
    }
}
