//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every configured address normalizes to a backend address
//! - Validate value ranges (timeouts > 0, redirect status)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::routing::BackendAddress;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_socket_addr(&mut errors, "backend.bind_address", &config.backend.bind_address);
    check_backend_address(&mut errors, "upstream.address", &config.upstream.address);
    check_backend_address(&mut errors, "client.target_address", &config.client.target_address);
    if let Some(target) = &config.backend.redirect_to {
        check_backend_address(&mut errors, "backend.redirect_to", target);
    }

    check_path(&mut errors, "upstream.path", &config.upstream.path);
    check_path(&mut errors, "backend.path", &config.backend.path);
    check_path(&mut errors, "client.path", &config.client.path);

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    } else if config.timeouts.request_secs < config.timeouts.upstream_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must be at least timeouts.upstream_secs ({})",
                config.timeouts.upstream_secs
            ),
        ));
    }
    if !matches!(config.backend.redirect_status, 301 | 302) {
        errors.push(ValidationError::new(
            "backend.redirect_status",
            format!("must be 301 or 302, got {}", config.backend.redirect_status),
        ));
    }
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<SocketAddr>() {
        errors.push(ValidationError::new(field, format!("invalid socket address {value:?}: {e}")));
    }
}

fn check_backend_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = BackendAddress::parse(value) {
        errors.push(ValidationError::new(field, e.to_string()));
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::new(field, format!("must start with '/', got {value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RelayConfig::default();
        config.upstream.address = "ftp://backend:21".into();
        config.upstream.path = "process".into();
        config.timeouts.upstream_secs = 0;
        config.backend.redirect_status = 307;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "upstream.address",
                "upstream.path",
                "timeouts.upstream_secs",
                "backend.redirect_status",
            ]
        );
    }

    #[test]
    fn test_request_deadline_shorter_than_one_call() {
        let mut config = RelayConfig::default();
        config.timeouts.upstream_secs = 10;
        config.timeouts.request_secs = 5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
    }

    #[test]
    fn test_redirect_target_checked() {
        let mut config = RelayConfig::default();
        config.backend.redirect_to = Some("".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "backend.redirect_to");
    }
}
