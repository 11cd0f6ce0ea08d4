use anyhow::Result;
use chrono::Utc;
use rust_serial_analyzer::analysis::{analyze_recording, AnalysisReport};
use rust_serial_analyzer::config::AnalysisConfig;
use rust_serial_analyzer::recording::snapshot::snapshot_path;
use rust_serial_analyzer::recording::{export_wav, load_recording, save_recording, Recording};
use std::f64::consts::PI;
use tempfile::tempdir;

fn tone(freq: f64, fs: u32, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 512.0 + 200.0 * (2.0 * PI * freq * i as f64 / fs as f64).sin())
        .collect()
}

#[test]
fn test_saved_recording_analyzes_identically() -> Result<()> {
    let dir = tempdir()?;
    let path = snapshot_path(dir.path().join("recordings"), Utc::now());
    let recording = Recording::new(tone(300.0, 8000, 4096), 8000);

    save_recording(&recording, &path)?;
    let loaded = load_recording(&path)?;
    assert_eq!(loaded, recording);

    let config = AnalysisConfig::default();
    let before = analyze_recording(&recording, &config)?;
    let after = analyze_recording(&loaded, &config)?;
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn test_report_serializes_without_samples() -> Result<()> {
    let recording = Recording::new(tone(300.0, 8000, 2048), 8000);
    let report = analyze_recording(&recording, &AnalysisConfig::default())?.truncated(1000.0);

    let json = serde_json::to_string(&report)?;
    assert!(!json.contains("filtered_samples"));

    let parsed: AnalysisReport = serde_json::from_str(&json)?;
    assert_eq!(parsed.original, report.original);
    assert!(parsed.filtered_samples.is_empty());

    Ok(())
}

#[test]
fn test_filtered_signal_exports_as_wav() -> Result<()> {
    let dir = tempdir()?;
    let recording = Recording::new(tone(2500.0, 8000, 2048), 8000);
    let report = analyze_recording(&recording, &AnalysisConfig::default())?;

    let filtered = recording.with_samples(report.filtered_samples.clone());
    assert_eq!(filtered.sampling_frequency_hz, 8000);
    assert_eq!(filtered.len(), recording.len());

    let path = dir.path().join("filtered.wav");
    export_wav(&filtered, &path)?;
    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.len() as usize, filtered.len());

    Ok(())
}
