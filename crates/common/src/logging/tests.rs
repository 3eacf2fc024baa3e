//! Unit tests for the logging subsystem.

use std::{env, path::PathBuf};

use tracing_subscriber::{filter::LevelFilter, fmt::format::FmtSpan};

use super::{format_service_name, manager::default_filter, types::*, Rotation};

#[test]
fn test_logger_config_defaults() {
    let config = LoggerConfig::default();
    assert_eq!(config.service_name, "tokenscout");
    assert_eq!(config.service_version, None);
    assert!(!config.stdout_config.json_format);
    assert!(config.file_logging_config.is_none());
}

#[test]
fn test_logger_config_builder_pattern() {
    let config = LoggerConfig::new("test-service".to_string())
        .with_service_version("2.0.0".to_string())
        .with_json_logging(true)
        .with_fmt_span(FmtSpan::CLOSE)
        .with_file_logging(FileLoggingConfig::new(
            PathBuf::from("/tmp/logs"),
            "test".to_string(),
        ));

    assert_eq!(config.service_name, "test-service");
    assert_eq!(config.service_version, Some("2.0.0".to_string()));
    assert!(config.stdout_config.json_format);
    assert_eq!(config.stdout_config.fmt_span, FmtSpan::CLOSE);

    let file = config.file_logging_config.expect("file logging enabled");
    assert_eq!(file.directory, PathBuf::from("/tmp/logs"));
    assert_eq!(file.file_name_prefix, "test");
    assert!(!file.json_format);
}

#[test]
fn test_file_logging_config_builder() {
    let config = FileLoggingConfig::new(PathBuf::from("logs"), "tokenscout".to_string())
        .with_rotation(Rotation::HOURLY)
        .with_json_format(true);

    assert_eq!(config.rotation, Rotation::HOURLY);
    assert!(config.json_format);
}

#[test]
fn test_default_filter_is_info() {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }
    assert_eq!(default_filter().max_level_hint(), Some(LevelFilter::INFO));
}

#[test]
fn test_format_service_name() {
    assert_eq!(format_service_name("tokenscout", None), "tokenscout");
    assert_eq!(
        format_service_name("tokenscout", Some("testnet")),
        "tokenscout%testnet"
    );
}
