//! Relay core.
//!
//! Sequences admission, validation and failover for one request:
//!
//! ```text
//! RECEIVED → RATE_CHECK ─┬─ REJECTED_RATE_LIMIT                     (429)
//!                        └─ VALIDATING ─┬─ REJECTED_INVALID         (400/405)
//!                                       └─ DISPATCHED ─┬─ SUCCEEDED (upstream answer)
//!                                                      └─ FAILED_ALL_UPSTREAMS (502)
//! ```
//!
//! A terminal failure is never retried here; the only retries are the
//! failover attempts inside `resilience::failover`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::config::RelayConfig;
use crate::http::response::{answer_response, preflight_response};
use crate::observability::metrics;
use crate::relay::error::{AdmissionError, RelayError};
use crate::relay::validator::validate;
use crate::resilience::FailoverResolver;
use crate::security::rate_limit::{Admission, RateLimiter};
use crate::upstream::client::{HttpUpstream, Upstream};
use crate::upstream::registry::{ProviderRegistry, RegistryError};

#[derive(Debug, Error)]
pub enum RelayBuildError {
    #[error("invalid provider registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Terminal state of a relay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    RateLimited,
    Invalid,
    Preflight,
    Answered,
    UpstreamFailed,
}

impl Outcome {
    /// Label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::RateLimited => "rate_limited",
            Outcome::Invalid => "invalid",
            Outcome::Preflight => "preflight",
            Outcome::Answered => "answered",
            Outcome::UpstreamFailed => "upstream_failed",
        }
    }
}

/// Terminal-state counters.
#[derive(Debug, Default)]
pub struct RelayStats {
    received: AtomicU64,
    rate_limited: AtomicU64,
    invalid: AtomicU64,
    preflight: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub rate_limited: u64,
    pub invalid: u64,
    pub preflight: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl RelayStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            preflight: self.preflight.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::RateLimited => &self.rate_limited,
            Outcome::Invalid => &self.invalid,
            Outcome::Preflight => &self.preflight,
            Outcome::Answered => &self.succeeded,
            Outcome::UpstreamFailed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Rate limiter → validator → failover → response assembly.
pub struct RelayCore {
    registry: Arc<ProviderRegistry>,
    limiter: Option<RateLimiter>,
    resolver: FailoverResolver,
    attempt_timeout: Duration,
    cache_ttl_secs: u64,
    max_message_bytes: usize,
    stats: RelayStats,
}

impl RelayCore {
    /// Assemble a relay from its collaborators.
    ///
    /// `limiter` is `None` when rate limiting is disabled.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        limiter: Option<RateLimiter>,
        upstream: Arc<dyn Upstream>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            registry,
            limiter,
            resolver: FailoverResolver::new(upstream, config.relay.selection_seed),
            attempt_timeout: Duration::from_millis(config.upstream.attempt_timeout_ms),
            cache_ttl_secs: config.relay.cache_ttl_secs,
            max_message_bytes: config.relay.max_message_bytes,
            stats: RelayStats::default(),
        }
    }

    /// Build a relay with the HTTP upstream client and an in-process limiter.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayBuildError> {
        let registry = Arc::new(ProviderRegistry::from_config(&config.providers)?);
        let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);
        let limiter = config
            .rate_limit
            .enabled
            .then(|| RateLimiter::from_config(&config.rate_limit));
        Ok(Self::new(registry, limiter, upstream, config))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn limiter(&self) -> Option<&RateLimiter> {
        self.limiter.as_ref()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Handle one relay request from `client_key`. Always yields a response.
    pub async fn handle(&self, client_key: &str, request_id: &str, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let (outcome, response) = match self.process(client_key, request_id, request).await {
            Ok((outcome, response)) => (outcome, response),
            Err(e) => {
                match &e {
                    RelayError::Exhausted(exhausted) => tracing::error!(
                        request_id = %request_id,
                        failures = ?exhausted.failures,
                        "All upstream resolvers failed"
                    ),
                    other => tracing::debug!(request_id = %request_id, error = %other, "Request rejected"),
                }
                (e.outcome(), e.into_response())
            }
        };

        self.stats.record(outcome);
        metrics::record_request(&method, outcome.as_str(), start);
        response
    }

    async fn process(
        &self,
        client_key: &str,
        request_id: &str,
        request: Request<Body>,
    ) -> Result<(Outcome, Response), RelayError> {
        tracing::debug!(request_id = %request_id, client = %client_key, state = "RATE_CHECK");
        if let Some(limiter) = &self.limiter {
            if let Admission::Rejected { retry_after } = limiter.admit(client_key) {
                tracing::warn!(request_id = %request_id, client = %client_key, "Rate limit exceeded");
                metrics::record_rate_limited();
                return Err(AdmissionError { retry_after }.into());
            }
        }

        if request.method() == Method::OPTIONS {
            return Ok((Outcome::Preflight, preflight_response()));
        }

        tracing::debug!(request_id = %request_id, state = "VALIDATING");
        let query = validate(request, self.max_message_bytes).await?;

        tracing::debug!(request_id = %request_id, method = query.method(), state = "DISPATCHED");
        let answer = self
            .resolver
            .resolve(&query, &self.registry, self.attempt_timeout)
            .await?;

        tracing::debug!(
            request_id = %request_id,
            provider = %answer.provider,
            state = "SUCCEEDED"
        );
        Ok((Outcome::Answered, answer_response(answer, self.cache_ttl_secs)))
    }
}
