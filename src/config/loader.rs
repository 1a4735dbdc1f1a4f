//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the proxy listener address.
pub const ENV_BIND_ADDRESS: &str = "RELAY_BIND_ADDRESS";
/// Overrides the initial backend address.
pub const ENV_UPSTREAM_ADDRESS: &str = "RELAY_UPSTREAM_ADDRESS";
/// Overrides the proxy address used by the client loop.
pub const ENV_CLIENT_TARGET: &str = "RELAY_CLIENT_TARGET";
/// Arms the backend redirect towards this address.
pub const ENV_NEW_SERVER_ADDRESS: &str = "NEW_SERVER_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied before validation.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: RelayConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults plus environment overrides.
pub fn from_env() -> Result<RelayConfig, ConfigError> {
    let mut config = RelayConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(bind) = read(ENV_BIND_ADDRESS) {
        config.listener.bind_address = bind;
    }
    if let Some(address) = read(ENV_UPSTREAM_ADDRESS) {
        config.upstream.address = address;
    }
    if let Some(target) = read(ENV_CLIENT_TARGET) {
        config.client.target_address = target;
    }
    if let Some(new_address) = read(ENV_NEW_SERVER_ADDRESS) {
        config.backend.redirect_to = Some(new_address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_UPSTREAM_ADDRESS, "backend-b:8081"),
            (ENV_NEW_SERVER_ADDRESS, "http://new-server:8081/process"),
            (ENV_BIND_ADDRESS, "  "),
        ]);

        let mut config = RelayConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.upstream.address, "backend-b:8081");
        assert_eq!(
            config.backend.redirect_to.as_deref(),
            Some("http://new-server:8081/process")
        );
        // blank values leave the default in place
        assert_eq!(config.listener.bind_address, "0.0.0.0:8082");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/relay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let path = std::env::temp_dir().join(format!("relay-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[upstream\naddress = 1").unwrap();
        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("relay-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[upstream]\npath = \"process\"\n").unwrap();
        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        match err {
            ConfigError::Validation(errors) => assert!(!errors.is_empty()),
            other => panic!("expected validation error, got {other}"),
        }
    }
}
