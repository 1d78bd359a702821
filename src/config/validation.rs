//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, weights > 0, window > 0)
//! - Check provider URLs and uniqueness of provider names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{RelayConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one provider must be configured")]
    NoProviders,

    #[error("provider '{0}' has weight 0; weights must be positive")]
    ZeroWeight(String),

    #[error("provider '{name}' has invalid url '{url}': {reason}")]
    InvalidProviderUrl { name: String, url: String, reason: String },

    #[error("provider name '{0}' is used more than once")]
    DuplicateProvider(String),

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("relay path '{0}' must start with '/'")]
    InvalidRelayPath(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("admin.api_key must be set to a non-default value when the admin API is enabled")]
    WeakAdminKey,
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }
    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBindAddress(config.admin.bind_address.clone()));
        }
        let key = config.admin.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_API_KEY {
            errors.push(ValidationError::WeakAdminKey);
        }
    }

    if !config.relay.path.starts_with('/') {
        errors.push(ValidationError::InvalidRelayPath(config.relay.path.clone()));
    }
    if config.relay.max_message_bytes == 0 {
        errors.push(ValidationError::ZeroValue("relay.max_message_bytes"));
    }
    if config.upstream.attempt_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue("upstream.attempt_timeout_ms"));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::ZeroValue("rate_limit.max_requests"));
    }
    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::ZeroValue("rate_limit.window_ms"));
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroValue("rate_limit.sweep_interval_secs"));
    }

    if config.providers.is_empty() {
        errors.push(ValidationError::NoProviders);
    }

    let mut seen = HashSet::new();
    for provider in config.providers.iter() {
        if !seen.insert(provider.name.as_str()) {
            errors.push(ValidationError::DuplicateProvider(provider.name.clone()));
        }
        if provider.weight == 0 {
            errors.push(ValidationError::ZeroWeight(provider.name.clone()));
        }
        if let Err(reason) = check_provider_url(&provider.url) {
            errors.push(ValidationError::InvalidProviderUrl {
                name: provider.name.clone(),
                url: provider.url.clone(),
                reason,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_provider_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "https" | "http" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}
