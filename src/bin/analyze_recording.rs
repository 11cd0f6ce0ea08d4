// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Recording Analyzer
//!
//! Re-runs the offline analysis on a saved recording snapshot: low-pass
//! filtering and magnitude spectra of the original and filtered signals.
//! The report can be printed, written as JSON, and the filtered signal
//! exported as a WAV file.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use rust_serial_analyzer::analysis::analyze_recording;
use rust_serial_analyzer::config::AnalysisConfig;
use rust_serial_analyzer::preprocessing::DEFAULT_ORDER;
use rust_serial_analyzer::recording::{export_wav, load_recording};
use rust_serial_analyzer::spectral::WindowFunction;

#[derive(Parser)]
#[command(name = "analyze_recording")]
#[command(about = "Filter a saved recording and compare its spectra")]
struct Args {
    /// Recording snapshot (JSON) to analyze
    #[arg(value_name = "INPUT_FILE")]
    input: PathBuf,

    /// Low-pass cutoff frequency in Hz
    #[arg(short, long, default_value_t = 1000.0)]
    cutoff: f64,

    /// Butterworth filter order
    #[arg(short, long, default_value_t = DEFAULT_ORDER)]
    order: usize,

    /// Highest frequency reported, in Hz
    #[arg(long, default_value_t = 1000.0)]
    max_hz: f64,

    /// Number of peaks printed per spectrum
    #[arg(long, default_value_t = 5)]
    peaks: usize,

    /// Window applied before the FFT
    #[arg(long, value_enum, default_value_t = WindowArg::Hamming)]
    window: WindowArg,

    /// Write the report as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Export the filtered signal as a WAV file
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum WindowArg {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
}

impl From<WindowArg> for WindowFunction {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Rectangular => WindowFunction::Rectangular,
            WindowArg::Hann => WindowFunction::Hann,
            WindowArg::Hamming => WindowFunction::Hamming,
            WindowArg::Blackman => WindowFunction::Blackman,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let recording = load_recording(&args.input)?;
    println!("Analyzing recording: {}", args.input.display());
    println!("  Sample rate: {} Hz", recording.sampling_frequency_hz);
    println!("  Total samples: {}", recording.len());
    println!("  Duration: {:.2} seconds", recording.duration_secs());
    println!();

    let config = AnalysisConfig {
        cutoff_hz: args.cutoff,
        filter_order: args.order,
        display_max_hz: args.max_hz,
        window: args.window.into(),
        peak_count: args.peaks,
    };
    let report = analyze_recording(&recording, &config)
        .with_context(|| format!("Failed to analyze {}", args.input.display()))?;
    let shown = report.truncated(args.max_hz);

    for (label, spectrum) in [("Original", &shown.original), ("Filtered", &shown.filtered)] {
        println!("{} spectrum (up to {} Hz):", label, args.max_hz);
        let peaks = spectrum.peaks(args.peaks);
        if peaks.is_empty() {
            println!("  no peak");
        }
        for (frequency, magnitude) in peaks {
            println!("  {:>10.2} Hz  {:>12.4}", frequency, magnitude);
        }
        println!();
    }

    if let Some(path) = &args.json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &shown)
            .context("Failed to write the analysis report")?;
        info!("Report written to {}", path.display());
    }

    if let Some(path) = &args.wav {
        let filtered = recording.with_samples(report.filtered_samples.clone());
        export_wav(&filtered, path)?;
    }

    Ok(())
}
