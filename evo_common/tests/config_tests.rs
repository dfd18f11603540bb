//! Configuration loading integration tests.

use evo_common::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
use serde::Deserialize;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Debug, Deserialize)]
struct ServiceConfig {
    shared: SharedConfig,
    #[serde(default)]
    capacity: Option<usize>,
}

fn write_toml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    write!(file, "{content}").expect("write");
    file.flush().expect("flush");
    file
}

#[test]
fn load_from_file_reads_shared_table() {
    let file = write_toml(
        r#"capacity = 500

[shared]
log_level = "warn"
service_name = "evo-motion-log"
"#,
    );

    let config = ServiceConfig::load(file.path()).expect("load");
    assert_eq!(config.shared.log_level, LogLevel::Warn);
    assert_eq!(config.shared.service_name, "evo-motion-log");
    assert_eq!(config.capacity, Some(500));
    assert!(config.shared.validate().is_ok());
}

#[test]
fn missing_shared_table_is_parse_error() {
    let file = write_toml("capacity = 500\n");
    let result = ServiceConfig::load(file.path());
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn invalid_log_level_is_parse_error() {
    let result = ServiceConfig::from_toml(
        r#"[shared]
log_level = "verbose"
service_name = "x"
"#,
    );
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn directory_path_is_parse_error_not_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = ServiceConfig::load(dir.path());
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn error_messages_are_descriptive() {
    let err = ConfigError::ValidationError("log.capacity 0 out of range".to_string());
    assert!(err.to_string().contains("log.capacity"));
    assert_eq!(ConfigError::FileNotFound.to_string(), "Configuration file not found");
}
