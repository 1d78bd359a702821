//! Upstream DoH exchange.
//!
//! # Responsibilities
//! - Turn a validated `DnsQuery` into a request against one provider
//! - Return the raw upstream status and body
//!
//! # Design Decisions
//! - Status checking is left to the failover orchestrator so every
//!   implementation (including test doubles) is judged the same way
//! - Redirects are followed (bounded), so a provider that moved its
//!   endpoint is judged by the final answer
//! - Repeated client parameters collapse to one, the last value wins
//! - Answers are read with a cap at the largest possible DNS message

use axum::body::Bytes;
use axum::http::{header, StatusCode};
use futures_util::future::BoxFuture;
use url::Url;

use crate::config::UpstreamConfig;
use crate::relay::error::UpstreamError;
use crate::upstream::provider::ProviderDescriptor;

/// Media type of DNS wire-format messages.
pub const DNS_MESSAGE: &str = "application/dns-message";

/// Largest DNS message an upstream may return.
pub const MAX_ANSWER_BYTES: usize = 65_535;

/// Redirect hops followed before an upstream counts as failed.
const MAX_REDIRECTS: usize = 5;

/// A validated client query, opaque apart from its transport encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsQuery {
    /// `dns` parameter (base64url) plus every other query parameter.
    Get {
        dns: String,
        passthrough: Vec<(String, String)>,
    },
    /// Raw wire-format body.
    Post { body: Bytes },
}

impl DnsQuery {
    /// Upstream URL for a GET query against `base`.
    ///
    /// `dns` is set first, the remaining client parameters follow in the
    /// order of their first appearance. A repeated key keeps its last value.
    pub fn upstream_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let DnsQuery::Get { dns, passthrough } = self {
            let mut params: Vec<(&str, &str)> = vec![("dns", dns.as_str())];
            for (key, value) in passthrough {
                match params.iter_mut().find(|param| param.0 == key.as_str()) {
                    Some(slot) => slot.1 = value.as_str(),
                    None => params.push((key.as_str(), value.as_str())),
                }
            }
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    pub fn method(&self) -> &'static str {
        match self {
            DnsQuery::Get { .. } => "GET",
            DnsQuery::Post { .. } => "POST",
        }
    }
}

/// Raw answer from one upstream.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// One DoH exchange with one provider.
pub trait Upstream: Send + Sync {
    fn exchange<'a>(
        &'a self,
        provider: &'a ProviderDescriptor,
        query: &'a DnsQuery,
    ) -> BoxFuture<'a, Result<UpstreamResponse, UpstreamError>>;
}

/// `reqwest`-backed upstream client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }
}

impl Upstream for HttpUpstream {
    fn exchange<'a>(
        &'a self,
        provider: &'a ProviderDescriptor,
        query: &'a DnsQuery,
    ) -> BoxFuture<'a, Result<UpstreamResponse, UpstreamError>> {
        Box::pin(async move {
            let request = match query {
                DnsQuery::Get { .. } => self.client.get(query.upstream_url(&provider.url)),
                DnsQuery::Post { body } => self
                    .client
                    .post(provider.url.clone())
                    .header(header::CONTENT_TYPE, DNS_MESSAGE)
                    .body(body.clone()),
            };

            let transport = |e: reqwest::Error| UpstreamError::Transport {
                provider: provider.name.clone(),
                message: e.to_string(),
            };

            let mut response = request
                .header(header::ACCEPT, DNS_MESSAGE)
                .send()
                .await
                .map_err(transport)?;
            let status = response.status();

            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await.map_err(transport)? {
                if body.len() + chunk.len() > MAX_ANSWER_BYTES {
                    return Err(UpstreamError::Oversized {
                        provider: provider.name.clone(),
                        limit: MAX_ANSWER_BYTES,
                    });
                }
                body.extend_from_slice(&chunk);
            }

            Ok(UpstreamResponse { status, body: Bytes::from(body) })
        })
    }
}
