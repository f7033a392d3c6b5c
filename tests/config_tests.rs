// Config loading and validation tests

use pcstatus::config::{AppConfig, DisplayFormat};
use std::io::Write;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[sampling]
period_ms = 500
cpu_window_ms = 1000
max_workers = 4
deadline_grace_ms = 250
stats_log_interval_secs = 30

[display]
format = "json"
clear_screen = false
channel_capacity = 8
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.sampling.period_ms, 500);
    assert_eq!(config.sampling.cpu_window_ms, 1000);
    assert_eq!(config.sampling.max_workers, Some(4));
    assert_eq!(config.display.format, DisplayFormat::Json);
    assert!(!config.display.clear_screen);
    assert_eq!(config.display.channel_capacity, 8);
}

#[test]
fn test_scheduler_config_conversion() {
    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    let scheduler = config.sampling.scheduler_config();
    assert_eq!(scheduler.period, Duration::from_millis(500));
    assert_eq!(scheduler.max_workers, Some(4));
    assert_eq!(scheduler.deadline_grace, Duration::from_millis(250));
    assert_eq!(scheduler.stats_log_interval, Duration::from_secs(30));
    assert_eq!(config.sampling.cpu_window(), Duration::from_secs(1));
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = AppConfig::load_from_str("").expect("empty config");
    assert_eq!(config.sampling.period_ms, 500);
    assert_eq!(config.sampling.cpu_window_ms, 1000);
    assert_eq!(config.sampling.max_workers, None);
    assert_eq!(config.sampling.deadline_grace_ms, 500);
    assert_eq!(config.display.format, DisplayFormat::Text);
    assert!(config.display.clear_screen);
    assert_eq!(config.display.channel_capacity, 16);
}

#[test]
fn test_partial_section_fills_defaults() {
    let config = AppConfig::load_from_str("[sampling]\nperiod_ms = 250\n").unwrap();
    assert_eq!(config.sampling.period_ms, 250);
    assert_eq!(config.sampling.cpu_window_ms, 1000);
}

#[test]
fn test_config_validation_rejects_zero_period() {
    let bad = VALID_CONFIG.replace("period_ms = 500", "period_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sampling.period_ms"));
}

#[test]
fn test_config_validation_rejects_zero_cpu_window() {
    let bad = VALID_CONFIG.replace("cpu_window_ms = 1000", "cpu_window_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("cpu_window_ms"));
}

#[test]
fn test_config_validation_rejects_zero_workers() {
    let bad = VALID_CONFIG.replace("max_workers = 4", "max_workers = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_workers"));
}

#[test]
fn test_config_validation_rejects_zero_stats_interval() {
    let bad = VALID_CONFIG.replace("stats_log_interval_secs = 30", "stats_log_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_validation_rejects_zero_channel_capacity() {
    let bad = VALID_CONFIG.replace("channel_capacity = 8", "channel_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("display.channel_capacity"));
}

#[test]
fn test_unknown_display_format_is_rejected() {
    let bad = VALID_CONFIG.replace("format = \"json\"", "format = \"html\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_load_from_missing_path_uses_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let config = AppConfig::load_from_path(path.to_str().unwrap()).expect("defaults");
    assert_eq!(config.sampling.period_ms, 500);
}

#[test]
fn test_load_from_path_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(VALID_CONFIG.as_bytes()).unwrap();
    let config = AppConfig::load_from_path(file.path().to_str().unwrap()).expect("load");
    assert_eq!(config.sampling.max_workers, Some(4));
}

#[test]
fn test_load_from_path_propagates_parse_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[sampling]\nperiod_ms = \"fast\"\n").unwrap();
    assert!(AppConfig::load_from_path(file.path().to_str().unwrap()).is_err());
}
