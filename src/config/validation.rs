//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window and budget > 0, bind address parses)
//! - Enforce the CORS allow-list rules
//! - Keep storage directory names to single path components
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use std::path::{Component, Path};

use crate::config::schema::GatewayConfig;
use crate::security::cors::{check_origin, OriginError};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),
    #[error("listener.request_timeout_secs must be greater than zero")]
    RequestTimeout,
    #[error("rate_limit.window_secs must be greater than zero")]
    ZeroWindow,
    #[error("rate_limit.max_requests must be greater than zero")]
    ZeroBudget,
    #[error("rate_limit.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,
    #[error("cors.allowed_origins: {0}")]
    Origin(#[from] OriginError),
    #[error("storage.{field} '{value}' must be a single directory name")]
    DirectoryName { field: &'static str, value: String },
    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.enabled {
        if rate_limit.window_secs == 0 {
            errors.push(ValidationError::ZeroWindow);
        }
        if rate_limit.max_requests == 0 {
            errors.push(ValidationError::ZeroBudget);
        }
        if rate_limit.sweep_interval_secs == 0 {
            errors.push(ValidationError::ZeroSweepInterval);
        }
    }

    for origin in &config.cors.allowed_origins {
        if let Err(e) = check_origin(origin) {
            errors.push(e.into());
        }
    }

    let storage = &config.storage;
    for (field, value) in [
        ("database_dir", &storage.database_dir),
        ("static_dir", &storage.static_dir),
        ("workflows_dir", &storage.workflows_dir),
    ] {
        if !is_single_component(value) {
            errors.push(ValidationError::DirectoryName {
                field,
                value: value.clone(),
            });
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
