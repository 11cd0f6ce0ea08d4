// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the serial analyzer application
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings for the application. The configuration is backed by a
//! YAML file and validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! The application's configuration is organized as a nested structure with sections:
//! - `serial`: Serial port of the acquisition board
//! - `handshake`: Bounds of the wait for the board's configuration announcement
//! - `acquisition`: Pacing of the acquisition loop and stream capacities
//! - `recording`: Recording duration and snapshot output
//! - `analysis`: Low-pass filter and spectrum settings
//! - `simulation`: Synthetic board used in place of the serial port
//!
//! ## Usage
//!
//! ```no_run
//! use rust_serial_analyzer::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("/dev/ttyACM0".to_string()), // Serial port
//!     Some(230400),                     // Baud rate
//!     false,                            // Simulate
//!     Some(5.0),                        // Recording duration
//!     Some(800.0),                      // Low-pass cutoff
//!     None,                             // Output directory
//! );
//!
//! println!("Serial port: {}", config.serial.port);
//! ```

pub mod acquisition;
pub mod analysis;
pub mod handshake;
pub mod recording;
pub mod serial;
pub mod simulation;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

// Re-export all types for public API
pub use acquisition::AcquisitionConfig;
pub use analysis::AnalysisConfig;
pub use handshake::HandshakeConfig;
pub use recording::RecordingConfig;
pub use serial::SerialConfig;
pub use simulation::SimulationConfig;
pub use utils::{output_config_schema, validate_specific_rules};

/// Root configuration structure of the application.
///
/// # Structure
///
/// The configuration is designed to be deserialized from and serialized to YAML
/// using the serde framework. The structure is validated against a JSON schema
/// to ensure all fields have valid values.
///
/// # Default Values
///
/// Each section uses default values when not explicitly specified in the configuration
/// file, allowing for minimal configuration when custom settings are not required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Serial port settings.
    #[serde(default)]
    pub serial: SerialConfig,

    /// Configuration handshake settings.
    #[serde(default)]
    pub handshake: HandshakeConfig,

    /// Acquisition loop settings.
    ///
    /// This section controls the polling of the link and the capacity of the
    /// live and recording streams. If not specified, default values will be used.
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Recording settings.
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Offline analysis settings.
    ///
    /// This section controls the low-pass filter applied to recordings and the
    /// spectrum summary. If not specified, default values will be used.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Simulated board settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        // Create parent directories if they don't exist
        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with default values. A file that fails
    /// validation produces a `<name>.sample.yaml` next to it and an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        let schema_str = include_str!("../../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        // Perform additional specific validations
        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only explicitly provided values override the loaded configuration.
    ///
    /// # Parameters
    ///
    /// * `port` - Serial device of the acquisition board
    /// * `baud_rate` - Baud rate of the serial link
    /// * `simulate` - If true, use the simulated board instead of the serial port
    /// * `record_duration` - Recording duration in seconds
    /// * `cutoff_hz` - Low-pass cutoff frequency in Hz
    /// * `output_dir` - Directory receiving recording snapshots
    pub fn apply_args(
        &mut self,
        port: Option<String>,
        baud_rate: Option<u32>,
        simulate: bool,
        record_duration: Option<f64>,
        cutoff_hz: Option<f64>,
        output_dir: Option<PathBuf>,
    ) {
        if let Some(port) = port {
            debug!("Overriding serial port from command line: {}", port);
            self.serial.port = port;
        }
        if let Some(baud_rate) = baud_rate {
            debug!("Overriding baud rate from command line: {}", baud_rate);
            self.serial.baud_rate = baud_rate;
        }
        if simulate {
            debug!("Enabling simulated source from command line");
            self.simulation.enabled = true;
        }
        if let Some(duration) = record_duration {
            debug!("Overriding recording duration from command line: {}", duration);
            self.recording.duration_sec = duration;
        }
        if let Some(cutoff) = cutoff_hz {
            debug!("Overriding cutoff frequency from command line: {}", cutoff);
            self.analysis.cutoff_hz = cutoff;
        }
        if let Some(dir) = output_dir {
            debug!("Overriding output directory from command line: {:?}", dir);
            self.recording.output_dir = dir.to_string_lossy().to_string();
        }
    }
}
