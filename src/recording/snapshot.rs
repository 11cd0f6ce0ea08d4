// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Recording snapshots
//!
//! Recordings are saved as JSON documents:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "saved_at": "2025-06-01T12:00:00Z",
//!   "recording": { "samples": [512.0, 514.5], "sampling_frequency_hz": 8000 }
//! }
//! ```
//!
//! Sample values round-trip exactly. A recording can also be exported as a
//! mono WAV file for external audio tools.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use hound::{SampleFormat, WavSpec, WavWriter};
use log::info;
use serde::{Deserialize, Serialize};

use super::Recording;

/// Current snapshot layout version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format_version: u32,
    saved_at: DateTime<Utc>,
    recording: Recording,
}

/// Save `recording` to `path` as a JSON snapshot
///
/// Parent directories are created as needed. Recordings containing NaN or
/// infinite samples are refused, JSON cannot represent them.
pub fn save_recording(recording: &Recording, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(index) = recording.samples.iter().position(|s| !s.is_finite()) {
        bail!("Recording contains a non-finite sample at index {}", index);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let snapshot = Snapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        saved_at: Utc::now(),
        recording: recording.clone(),
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create snapshot file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &snapshot).context("Failed to serialize recording")?;
    writer.flush()?;

    info!(
        "Saved recording ({} samples, {} Hz) to {}",
        recording.len(),
        recording.sampling_frequency_hz,
        path.display()
    );
    Ok(())
}

/// Load a recording saved by [`save_recording`]
pub fn load_recording(path: impl AsRef<Path>) -> Result<Recording> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot file {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse snapshot file {}", path.display()))?;

    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        bail!(
            "Unsupported snapshot format version {} (expected {})",
            snapshot.format_version,
            SNAPSHOT_FORMAT_VERSION
        );
    }
    if snapshot.recording.sampling_frequency_hz == 0 {
        bail!("Snapshot has an invalid sampling frequency of 0 Hz");
    }

    info!(
        "Loaded recording saved at {} ({} samples, {} Hz)",
        snapshot.saved_at,
        snapshot.recording.len(),
        snapshot.recording.sampling_frequency_hz
    );
    Ok(snapshot.recording)
}

/// File name for a snapshot saved at `saved_at`, e.g. `recording_20250601_120000.json`
pub fn snapshot_path(dir: impl AsRef<Path>, saved_at: DateTime<Utc>) -> PathBuf {
    dir.as_ref()
        .join(format!("recording_{}.json", saved_at.format("%Y%m%d_%H%M%S")))
}

/// Export `recording` as a mono 32-bit float WAV file
///
/// Raw ADC values are far outside the `[-1, 1]` range audio tools expect, so
/// the samples are centred on their mean and scaled to a peak of 1.0.
pub fn export_wav(recording: &Recording, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: 1,
        sample_rate: recording.sampling_frequency_hz,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mean = if recording.is_empty() {
        0.0
    } else {
        recording.samples.iter().sum::<f64>() / recording.len() as f64
    };
    let peak = recording
        .samples
        .iter()
        .map(|s| (s - mean).abs())
        .fold(0.0_f64, f64::max);
    let scale = if peak > 0.0 { 1.0 / peak } else { 1.0 };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file {}", path.display()))?;
    for &sample in &recording.samples {
        writer.write_sample(((sample - mean) * scale) as f32)?;
    }
    writer.finalize()?;

    info!("Exported recording to {}", path.display());
    Ok(())
}
