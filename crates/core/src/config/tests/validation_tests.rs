use crate::config::models::{ApiConfig, AppConfig, DatabaseConfig, ObservabilityConfig};

#[test]
fn test_database_url_must_be_sqlite_or_memory() {
    let mut db = DatabaseConfig::default();
    db.url = "postgresql://localhost/simulator".to_string();
    assert!(db.validate().is_err());

    db.url = "memory://".to_string();
    assert!(db.validate().is_ok());

    db.url = "sqlite::memory:".to_string();
    assert!(db.validate().is_ok());
}

#[test]
fn test_database_connection_bounds() {
    let mut db = DatabaseConfig::default();
    db.min_connections = 10;
    assert!(db.validate().is_err());

    let mut db = DatabaseConfig::default();
    db.max_connections = 0;
    assert!(db.validate().is_err());
}

#[test]
fn test_api_prefix_shape() {
    let mut api = ApiConfig::default();
    api.path_prefix = String::new();
    assert!(api.validate().is_ok());

    api.path_prefix = "api".to_string();
    assert!(api.validate().is_err());

    api.path_prefix = "/api/".to_string();
    assert!(api.validate().is_err());
}

#[test]
fn test_api_bind_address_must_parse() {
    let mut api = ApiConfig::default();
    api.bind_address = "localhost".to_string();
    assert!(api.validate().is_err());
}

#[test]
fn test_observability_values() {
    let mut obs = ObservabilityConfig::default();
    obs.log_level = "WARN".to_string();
    assert!(obs.validate().is_ok());

    obs.log_level = "loud".to_string();
    assert!(obs.validate().is_err());

    let mut obs = ObservabilityConfig::default();
    obs.log_format = "xml".to_string();
    assert!(obs.validate().is_err());
}

#[test]
fn test_simulation_defaults_are_checked() {
    let mut config = AppConfig::default();
    config.simulation.count = 0;
    assert!(config.validate().is_err());
}
