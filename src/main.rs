// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the serial signal analyzer
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossbeam_channel::{unbounded, Receiver};
use log::{debug, error, info, warn};

use rust_serial_analyzer::acquisition::{
    get_serial_line_source, get_simulated_line_source, AcquisitionSession, Frame, LinkConfig,
};
use rust_serial_analyzer::analysis::analyze_recording;
use rust_serial_analyzer::config::{self, Config};
use rust_serial_analyzer::recording::snapshot::snapshot_path;
use rust_serial_analyzer::recording::{export_wav, save_recording, Recording};

/// Interval between two live stream summaries
const LIVE_SUMMARY_INTERVAL: Duration = Duration::from_secs(1);

/// Acquire, record and analyze a signal streamed over a serial link
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serial device of the acquisition board
    #[arg(long)]
    port: Option<String>,

    /// Baud rate of the serial link
    #[arg(long = "baud")]
    baud_rate: Option<u32>,

    /// Use the simulated board instead of the serial port
    #[arg(long)]
    simulate: bool,

    /// Start a recording of this many seconds as soon as the link is up
    #[arg(long, value_name = "SECONDS")]
    record: Option<f64>,

    /// Low-pass cutoff frequency in Hz
    #[arg(long)]
    cutoff: Option<f64>,

    /// Directory receiving recording snapshots
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Stop after the first recording has been analyzed
    #[arg(long)]
    exit_after_recording: bool,

    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;

    config.apply_args(
        args.port.clone(),
        args.baud_rate,
        args.simulate,
        args.record,
        args.cutoff,
        args.output_dir.clone(),
    );
    config::validate_specific_rules(&config)?;

    let source = if config.simulation.enabled {
        info!("Using the simulated acquisition board");
        get_simulated_line_source(&config.simulation)?
    } else {
        info!(
            "Opening serial port {} at {} baud",
            config.serial.port, config.serial.baud_rate
        );
        get_serial_line_source(&config.serial)?
    };

    let mut session = AcquisitionSession::connect(source, &config.handshake, &config.acquisition)?;
    let link = session.link();
    info!(
        "Link configured: {} Hz, {} samples per block ({:.1} ms)",
        link.sampling_frequency_hz,
        link.block_size,
        link.block_duration_secs() * 1000.0
    );

    let cancel = session.cancel_token();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping acquisition");
        cancel.cancel();
    })
    .context("Failed to install the Ctrl-C handler")?;

    let triggers = spawn_keyboard_trigger();
    info!(
        "Press Enter to record {} s, Ctrl-C to quit",
        config.recording.duration_sec
    );
    if args.record.is_some() {
        request_recording(&session, config.recording.duration_sec);
    }

    let tick = Duration::from_millis(config.acquisition.consumer_tick_ms);
    let mut monitor = LiveMonitor::new(link);
    while session.is_running() {
        while triggers.try_recv().is_ok() {
            request_recording(&session, config.recording.duration_sec);
        }

        for frame in session.drain_frames() {
            monitor.observe(&frame);
        }
        monitor.maybe_log(session.dropped_frames());

        while let Some(recording) = session.try_next_recording() {
            process_recording(&recording, &config);
            if args.exit_after_recording {
                session.cancel();
            }
        }

        thread::sleep(tick);
    }

    // Recordings emitted just before cancellation
    while let Some(recording) = session.try_next_recording() {
        process_recording(&recording, &config);
    }

    let stats = session.join()?;
    info!(
        "Acquisition stopped: {} lines, {} waveforms, {} spectra, {} malformed, {} read errors, {} recordings ({} discarded)",
        stats.lines_read,
        stats.waveform_frames,
        stats.spectrum_frames,
        stats.malformed_lines,
        stats.read_errors,
        stats.recordings_completed,
        stats.recordings_discarded
    );
    if session.dropped_recordings() > 0 {
        warn!(
            "{} recordings were dropped before they could be analyzed",
            session.dropped_recordings()
        );
    }

    Ok(())
}

/// Forward every line typed on stdin as a recording trigger
fn spawn_keyboard_trigger() -> Receiver<()> {
    let (tx, rx) = unbounded();
    let spawned = thread::Builder::new()
        .name("keyboard".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                if line.is_err() || tx.send(()).is_err() {
                    break;
                }
            }
            debug!("Keyboard trigger stopped");
        });
    if let Err(err) = spawned {
        warn!("Keyboard trigger unavailable: {}", err);
    }
    rx
}

fn request_recording(session: &AcquisitionSession, duration_sec: f64) {
    match session.start_recording(duration_sec) {
        Ok(()) => info!("Recording {} s", duration_sec),
        Err(err) => warn!("Cannot start recording: {}", err),
    }
}

/// Analyze, report and persist a completed recording
fn process_recording(recording: &Recording, config: &Config) {
    info!(
        "Recording complete: {} samples ({:.2} s)",
        recording.len(),
        recording.duration_secs()
    );

    match analyze_recording(recording, &config.analysis) {
        Ok(report) => report
            .truncated(config.analysis.display_max_hz)
            .log_summary(config.analysis.peak_count),
        Err(err) => error!("Analysis failed: {}", err),
    }

    let path = snapshot_path(&config.recording.output_dir, Utc::now());
    if let Err(err) = persist(recording, &path, config.recording.export_wav) {
        error!("Failed to save recording: {:#}", err);
    }
}

fn persist(recording: &Recording, path: &Path, with_wav: bool) -> Result<()> {
    save_recording(recording, path)?;
    if with_wav {
        export_wav(recording, path.with_extension("wav"))?;
    }
    Ok(())
}

/// Periodic summary of the live stream
struct LiveMonitor {
    link: LinkConfig,
    waveforms: u64,
    spectra: u64,
    last_level: Option<(f64, f64, f64)>,
    last_peak: Option<(f64, f64)>,
    last_log: Instant,
}

impl LiveMonitor {
    fn new(link: LinkConfig) -> Self {
        Self {
            link,
            waveforms: 0,
            spectra: 0,
            last_level: None,
            last_peak: None,
            last_log: Instant::now(),
        }
    }

    fn observe(&mut self, frame: &Frame) {
        match frame {
            Frame::Waveform(samples) => {
                self.waveforms += 1;
                let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
                let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = samples.iter().sum::<f64>() / samples.len().max(1) as f64;
                self.last_level = Some((min, mean, max));
            }
            Frame::Spectrum(magnitudes) => {
                self.spectra += 1;
                // Bin 0 is not transmitted, index k holds bin k + 1
                let resolution = self.link.sampling_frequency_hz as f64 / self.link.block_size as f64;
                self.last_peak = magnitudes
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(k, m)| ((k + 1) as f64 * resolution, *m));
            }
        }
    }

    fn maybe_log(&mut self, dropped: u64) {
        if self.last_log.elapsed() < LIVE_SUMMARY_INTERVAL {
            return;
        }
        self.last_log = Instant::now();

        let level = self
            .last_level
            .map(|(min, mean, max)| format!("min {:.1} mean {:.1} max {:.1}", min, mean, max))
            .unwrap_or_else(|| "no waveform".to_string());
        let peak = self
            .last_peak
            .map(|(f, m)| format!("{:.1} Hz ({:.3})", f, m))
            .unwrap_or_else(|| "none".to_string());
        info!(
            "Live: {} waveforms, {} spectra, {} dropped | {} | board peak {}",
            self.waveforms, self.spectra, dropped, level, peak
        );
    }
}
