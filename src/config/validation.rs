//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Check option combinations (watching needs a rule file)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResponderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - The rule file is not required to exist: a missing file disables auto-response

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ResponderConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("autoresponder.rules_path is empty")]
    EmptyRulesPath,

    #[error("autoresponder.watch requires autoresponder.rules_path")]
    WatchWithoutRules,

    #[error("autoresponder.watch_poll_secs must be greater than 0")]
    ZeroPollInterval,

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("observability.log_level is not a valid filter: {0}")]
    InvalidLogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ResponderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let auto = &config.autoresponder;

    match &auto.rules_path {
        Some(path) if path.as_os_str().is_empty() => errors.push(ValidationError::EmptyRulesPath),
        None if auto.watch => errors.push(ValidationError::WatchWithoutRules),
        _ => {}
    }

    if auto.watch && auto.watch_poll_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
