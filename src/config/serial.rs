// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial link configuration
//!
//! This module defines the structures for configuring the serial port the
//! acquisition board is attached to.

use serde::{Deserialize, Serialize};

/// Configuration of the serial port.
///
/// The board resets when the port is opened, which is why a settle delay is
/// observed before the configuration handshake starts.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path (`/dev/ttyUSB0`, `COM6`, ...)
    pub port: String,

    /// Baud rate of the link. Must match the firmware.
    pub baud_rate: u32,

    /// Read timeout in milliseconds.
    ///
    /// Bounds how long a single read may block, and therefore how quickly the
    /// acquisition loop reacts to cancellation.
    pub read_timeout_ms: u64,

    /// Delay in milliseconds between opening the port and the handshake.
    pub settle_delay_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
            read_timeout_ms: 100,
            settle_delay_ms: 2000,
        }
    }
}
