//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Shipped admin key; refused when the admin API is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the DoH relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Relay endpoint behaviour.
    pub relay: RelaySettings,

    /// Upstream request settings.
    pub upstream: UpstreamConfig,

    /// Upstream DoH resolvers, in fallback order.
    pub providers: ProviderList,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Relay endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Path the relay endpoint is mounted on.
    pub path: String,

    /// `max-age` advertised in `Cache-Control` on successful answers.
    pub cache_ttl_secs: u64,

    /// Largest accepted POST body in bytes.
    pub max_message_bytes: usize,

    /// Header set by the hosting edge carrying the real client IP.
    /// Falls back to the TCP peer address when absent.
    pub client_ip_header: Option<String>,

    /// Fixed seed for weighted selection. Seeded from entropy when unset.
    pub selection_seed: Option<u64>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            path: "/dns-query".to_string(),
            cache_ttl_secs: 300,
            max_message_bytes: 512,
            client_ip_header: Some("cf-connecting-ip".to_string()),
            selection_seed: None,
        }
    }
}

/// Upstream request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Timeout for a single upstream attempt in milliseconds.
    pub attempt_timeout_ms: u64,

    /// User-Agent sent to upstream resolvers.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: 10_000,
            user_agent: concat!("doh-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Upstream resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Display name, used in logs and metrics.
    pub name: String,

    /// DoH endpoint URL (e.g., "https://dns.google/dns-query").
    pub url: String,

    /// Relative selection weight. Must be positive.
    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub description: String,
}

fn default_weight() -> u32 {
    1
}

/// Provider list with the public resolver set as its default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ProviderList(pub Vec<ProviderConfig>);

impl Default for ProviderList {
    fn default() -> Self {
        let provider = |name: &str, url: &str, weight, category: &str, description: &str| ProviderConfig {
            name: name.to_string(),
            url: url.to_string(),
            weight,
            category: category.to_string(),
            description: description.to_string(),
        };

        Self(vec![
            provider("Cloudflare", "https://cloudflare-dns.com/dns-query", 25, "public", "Fast, privacy-focused, no query logging."),
            provider("Google", "https://dns.google/dns-query", 20, "public", "Stable and fast worldwide."),
            provider("Quad9", "https://dns.quad9.net/dns-query", 20, "public", "Blocks malicious, phishing and malware domains."),
            provider("OpenDNS", "https://doh.opendns.com/dns-query", 10, "public", "One of the oldest public DNS services."),
            provider("DNS4EU", "https://dns.dns4.eu/dns-query", 15, "public", "European public resolver focused on privacy and security."),
            provider("AdGuard", "https://dns.adguard-dns.com/dns-query", 15, "ad-blocking", "Blocks ads, trackers and malicious sites."),
        ])
    }
}

impl std::ops::Deref for ProviderList {
    type Target = [ProviderConfig];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests admitted per client within one window.
    pub max_requests: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// How often expired entries are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_ms: 60_000,
            sweep_interval_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: PLACEHOLDER_API_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
