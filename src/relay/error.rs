//! Relay error taxonomy.
//!
//! Every variant maps onto a well-formed HTTP response; see
//! `http::response` for the mapping.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::relay::handler::Outcome;

/// Client exceeded its admission quota.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rate limit exceeded, retry after {retry_after:?}")]
pub struct AdmissionError {
    pub retry_after: Duration,
}

impl AdmissionError {
    /// `Retry-After` value in whole seconds, rounded up, at least 1.
    pub fn retry_after_secs(&self) -> u64 {
        let millis = self.retry_after.as_millis() as u64;
        millis.div_ceil(1000).max(1)
    }
}

/// Malformed, missing or oversized client input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing dns parameter")]
    MissingDnsParam,

    #[error("invalid dns parameter format")]
    InvalidDnsParam,

    #[error("invalid Content-Type {0:?}, expected application/dns-message")]
    UnsupportedContentType(Option<String>),

    #[error("empty DNS message")]
    EmptyBody,

    #[error("DNS message exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),
}

/// Failure of a single upstream attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("{provider}: transport error: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider}: timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    #[error("{provider}: upstream returned {status}")]
    Status { provider: String, status: StatusCode },

    #[error("{provider}: answer exceeds {limit} bytes")]
    Oversized { provider: String, limit: usize },
}

impl UpstreamError {
    pub fn provider(&self) -> &str {
        match self {
            UpstreamError::Transport { provider, .. }
            | UpstreamError::Timeout { provider, .. }
            | UpstreamError::Status { provider, .. }
            | UpstreamError::Oversized { provider, .. } => provider,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Transport { .. } => "transport",
            UpstreamError::Timeout { .. } => "timeout",
            UpstreamError::Status { .. } => "status",
            UpstreamError::Oversized { .. } => "oversized",
        }
    }
}

/// Every candidate in the failover chain failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("all {} upstream resolvers failed", failures.len())]
pub struct ExhaustionError {
    pub failures: Vec<UpstreamError>,
}

/// Terminal failure of a relay request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Exhausted(#[from] ExhaustionError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Admission(_) => StatusCode::TOO_MANY_REQUESTS,
            RelayError::Validation(ValidationError::MethodNotAllowed(_)) => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Exhausted(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Terminal state this error ends a request in.
    pub fn outcome(&self) -> Outcome {
        match self {
            RelayError::Admission(_) => Outcome::RateLimited,
            RelayError::Validation(_) => Outcome::Invalid,
            RelayError::Exhausted(_) => Outcome::UpstreamFailed,
        }
    }
}
