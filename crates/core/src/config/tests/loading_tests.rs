use std::io::Write;

use tempfile::NamedTempFile;

use crate::config::models::AppConfig;

#[test]
fn test_defaults_are_valid() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.api.bind_address, "0.0.0.0:8000");
    assert_eq!(config.api.path_prefix, "/api");
    assert_eq!(config.simulation.count, 10);
    assert_eq!(config.database.url, "sqlite://simulator.db");
}

#[test]
fn test_load_from_file_overrides_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[database]
url = "memory://"

[simulation]
count = 3
retries = 2
"#
    )
    .unwrap();

    let config = AppConfig::load(file.path().to_str()).unwrap();
    assert!(config.database.is_memory());
    assert_eq!(config.simulation.count, 3);
    assert_eq!(config.simulation.retries, 2);
    // untouched sections keep their defaults
    assert_eq!(config.simulation.min_interval, 2);
    assert_eq!(config.api.path_prefix, "/api");
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let result = AppConfig::load(Some("/definitely/not/here/simulator.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_rejects_invalid_file_values() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[simulation]
min_interval = 9
max_interval = 3
"#
    )
    .unwrap();

    assert!(AppConfig::load(file.path().to_str()).is_err());
}

#[test]
fn test_environment_override() {
    let file = NamedTempFile::new().unwrap();
    std::env::set_var("SIMULATOR__OBSERVABILITY__LOG_FORMAT", "json");

    let config = AppConfig::load(file.path().to_str());
    std::env::remove_var("SIMULATOR__OBSERVABILITY__LOG_FORMAT");

    let config = config.unwrap();
    assert_eq!(config.observability.log_format, "json");
}

#[test]
fn test_toml_round_trip_keeps_sections() {
    let config = AppConfig::default();
    let text = config.to_toml().unwrap();
    assert!(text.contains("[database]"));
    assert!(text.contains("[simulation]"));

    let parsed = AppConfig::from_toml(&text).unwrap();
    assert_eq!(parsed, config);
}
