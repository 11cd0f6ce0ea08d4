// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Recording configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RecordingConfig {
    /// Requested duration of a recording in seconds, rounded up to whole blocks
    pub duration_sec: f64,

    /// Directory receiving recording snapshots
    pub output_dir: String,

    /// Also write a WAV file next to each snapshot
    pub export_wav: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            duration_sec: 3.0,
            output_dir: "recordings".to_string(),
            export_wav: false,
        }
    }
}
