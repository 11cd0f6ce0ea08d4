// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::{debug, warn};

use super::Config;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line. It outputs the full JSON schema for the configuration
/// to stdout, formatted for readability.
///
/// # Example
///
/// ```bash
/// ./rust_serial_analyzer --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema_str = include_str!("../../resources/config.schema.json");

    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Serial port**: a device path is required unless the simulated source is enabled
/// - **Timing**: poll intervals and read timeouts must be non-zero
/// - **Recording**: the duration must be a positive, finite number of seconds
/// - **Analysis**: the cutoff must be positive and, for the simulated source,
///   below its Nyquist frequency; the filter order must be at least 1
/// - **Simulation**: the sampling frequency and block size must be usable, and
///   a tone above the Nyquist frequency only produces a warning
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if !config.simulation.enabled && config.serial.port.trim().is_empty() {
        anyhow::bail!("A serial port is required when the simulated source is disabled");
    }
    if config.serial.baud_rate == 0 {
        anyhow::bail!("Invalid baud rate: {}", config.serial.baud_rate);
    }
    if config.serial.read_timeout_ms == 0 {
        anyhow::bail!("Serial read timeout must be greater than 0 ms");
    }

    if config.handshake.max_attempts == 0 {
        anyhow::bail!("Handshake needs at least one attempt");
    }

    if config.acquisition.poll_interval_ms == 0 {
        anyhow::bail!("Acquisition poll interval must be greater than 0 ms");
    }
    if config.acquisition.consumer_tick_ms == 0 {
        anyhow::bail!("Consumer tick must be greater than 0 ms");
    }

    let duration = config.recording.duration_sec;
    if !duration.is_finite() || duration <= 0.0 {
        anyhow::bail!("Invalid recording duration: {} s", duration);
    }

    let cutoff = config.analysis.cutoff_hz;
    if !cutoff.is_finite() || cutoff <= 0.0 {
        anyhow::bail!("Invalid low-pass cutoff frequency: {} Hz", cutoff);
    }
    if config.analysis.filter_order == 0 {
        anyhow::bail!("Filter order must be at least 1");
    }
    if !config.analysis.display_max_hz.is_finite() || config.analysis.display_max_hz <= 0.0 {
        anyhow::bail!(
            "Invalid display frequency limit: {} Hz",
            config.analysis.display_max_hz
        );
    }

    let simulation = &config.simulation;
    if simulation.sampling_frequency_hz == 0 {
        anyhow::bail!("Simulated sampling frequency must be greater than 0");
    }
    if simulation.block_size <= 1 {
        anyhow::bail!(
            "Simulated block size must be greater than 1, got {}",
            simulation.block_size
        );
    }
    let nyquist = simulation.sampling_frequency_hz as f64 / 2.0;
    if simulation.enabled && cutoff >= nyquist {
        anyhow::bail!(
            "Cutoff frequency {} Hz must be below the simulated Nyquist frequency {} Hz",
            cutoff,
            nyquist
        );
    }
    if simulation.tone_hz >= nyquist {
        // Aliased but still a valid signal
        warn!(
            "Simulated tone {} Hz is above the Nyquist frequency {} Hz",
            simulation.tone_hz, nyquist
        );
    }

    Ok(())
}
