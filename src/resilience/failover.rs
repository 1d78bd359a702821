//! Failover orchestration across upstream resolvers.
//!
//! # Responsibilities
//! - Build the per-request candidate chain: one weighted pick, then every
//!   other provider in registry order
//! - Try candidates strictly one after another, each under its own timeout
//! - Stop at the first 2xx answer; aggregate every failure otherwise
//!
//! # Design Decisions
//! - Exactly one weighted draw per request; the residual order is stable
//! - Candidates are never raced, worst case is `n × attempt_timeout`
//! - The RNG lock is held only for the draw, never across an upstream call

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::StatusCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::observability::metrics;
use crate::relay::error::{ExhaustionError, UpstreamError};
use crate::resilience::timeouts::with_attempt_timeout;
use crate::upstream::client::{DnsQuery, Upstream};
use crate::upstream::provider::ProviderDescriptor;
use crate::upstream::weighted::select_index;

/// Successful upstream answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayAnswer {
    pub status: StatusCode,
    pub body: Bytes,
    pub provider: String,
}

pub type RelayOutcome = Result<RelayAnswer, ExhaustionError>;

/// Ordered candidates for one request: the weighted pick first, then the
/// remaining providers in their original relative order.
pub fn candidate_chain<'a, R: Rng + ?Sized>(
    providers: &'a [ProviderDescriptor],
    rng: &mut R,
) -> Vec<&'a ProviderDescriptor> {
    let Some(primary) = select_index(providers, rng) else {
        return Vec::new();
    };

    let mut chain = Vec::with_capacity(providers.len());
    chain.push(&providers[primary]);
    chain.extend(
        providers
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != primary)
            .map(|(_, provider)| provider),
    );
    chain
}

/// Sequential failover over a provider list.
pub struct FailoverResolver {
    upstream: Arc<dyn Upstream>,
    rng: Mutex<StdRng>,
}

impl FailoverResolver {
    /// Create a resolver. A fixed `seed` makes selection reproducible.
    pub fn new(upstream: Arc<dyn Upstream>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            upstream,
            rng: Mutex::new(rng),
        }
    }

    fn chain<'a>(&self, providers: &'a [ProviderDescriptor]) -> Vec<&'a ProviderDescriptor> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        candidate_chain(providers, &mut *rng)
    }

    /// Resolve `query` against `providers`, falling over on any failure.
    pub async fn resolve(
        &self,
        query: &DnsQuery,
        providers: &[ProviderDescriptor],
        attempt_timeout: Duration,
    ) -> RelayOutcome {
        let chain = self.chain(providers);
        let mut failures = Vec::with_capacity(chain.len());

        for (attempt, provider) in chain.into_iter().enumerate() {
            let started = Instant::now();
            let result = with_attempt_timeout(
                &provider.name,
                attempt_timeout,
                self.upstream.exchange(provider, query),
            )
            .await
            .and_then(|response| {
                if response.status.is_success() {
                    Ok(response)
                } else {
                    Err(UpstreamError::Status {
                        provider: provider.name.clone(),
                        status: response.status,
                    })
                }
            });

            match result {
                Ok(response) => {
                    metrics::record_upstream_attempt(&provider.name, "ok", started);
                    tracing::debug!(
                        provider = %provider.name,
                        attempt = attempt + 1,
                        status = %response.status,
                        "Upstream answered"
                    );
                    return Ok(RelayAnswer {
                        status: response.status,
                        body: response.body,
                        provider: provider.name.clone(),
                    });
                }
                Err(e) => {
                    metrics::record_upstream_attempt(&provider.name, e.kind(), started);
                    tracing::warn!(
                        provider = %provider.name,
                        attempt = attempt + 1,
                        error = %e,
                        "Upstream attempt failed, trying next provider"
                    );
                    failures.push(e);
                }
            }
        }

        Err(ExhaustionError { failures })
    }
}
