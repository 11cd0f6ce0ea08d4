use anyhow::Result;
use rust_serial_analyzer::config::{Config, HandshakeConfig, RecordingConfig, SerialConfig};
use rust_serial_analyzer::spectral::WindowFunction;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let mut config = Config {
        serial: SerialConfig {
            port: "/dev/ttyACM1".to_string(),
            baud_rate: 230400,
            ..SerialConfig::default()
        },
        recording: RecordingConfig {
            duration_sec: 1.5,
            output_dir: "captures".to_string(),
            export_wav: true,
        },
        ..Config::default()
    };
    config.analysis.window = WindowFunction::Blackman;
    config.simulation.seed = Some(7);

    config.save_to_file(&config_path)?;
    let loaded_config = Config::from_file(&config_path)?;

    assert_eq!(loaded_config, config);
    assert_eq!(loaded_config.serial.port, "/dev/ttyACM1");
    assert_eq!(loaded_config.analysis.window, WindowFunction::Blackman);

    Ok(())
}

#[test]
fn test_missing_file_creates_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("non_existent.yaml");

    let config = Config::from_file(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(config.serial.baud_rate, 115200);
    assert_eq!(config.recording.duration_sec, 3.0);
    assert_eq!(config.analysis.cutoff_hz, 1000.0);

    Ok(())
}

#[test]
fn test_partial_file_uses_section_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(
        &path,
        r#"
serial:
  port: COM6
recording:
  duration_sec: 0.5
"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.serial.port, "COM6");
    assert_eq!(config.serial.baud_rate, 115200);
    assert_eq!(config.recording.duration_sec, 0.5);
    assert_eq!(config.recording.output_dir, "recordings");
    assert_eq!(config.handshake, HandshakeConfig::default());

    Ok(())
}

#[test]
fn test_apply_args() {
    let mut config = Config::default();
    assert!(!config.simulation.enabled);

    config.apply_args(
        Some("/dev/ttyS3".to_string()),
        Some(9600),
        true,
        Some(2.0),
        Some(500.0),
        Some(PathBuf::from("out")),
    );

    assert_eq!(config.serial.port, "/dev/ttyS3");
    assert_eq!(config.serial.baud_rate, 9600);
    assert!(config.simulation.enabled);
    assert_eq!(config.recording.duration_sec, 2.0);
    assert_eq!(config.analysis.cutoff_hz, 500.0);
    assert_eq!(config.recording.output_dir, "out");

    // Absent arguments leave the configuration untouched
    let before = config.clone();
    config.apply_args(None, None, false, None, None, None);
    assert_eq!(config, before);
}
