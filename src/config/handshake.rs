// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration handshake settings

use serde::{Deserialize, Serialize};

/// Bounds of the wait for the board's `CONFIG:` announcement.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Maximum number of polls of the link before giving up
    pub max_attempts: usize,

    /// Delay in milliseconds after a poll that returned no line
    pub poll_delay_ms: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            poll_delay_ms: 200,
        }
    }
}
