//! DNS-over-HTTPS relay.
//!
//! Accepts RFC 8484 queries on a single path and forwards each one to a
//! weighted pick among public DoH resolvers, falling back through the rest
//! of the list when an upstream errors, times out or answers non-2xx.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ relay::handler ──┬─▶ security::rate_limit
//!                                                  ├─▶ relay::validator
//!                                                  └─▶ resilience::failover
//!                                                          │
//!                                                          ▼
//!                                          upstream::weighted + upstream::client
//!                                                          │
//!     Client ◀── http::response ◀──────────────────────────┘
//!
//!     Cross-cutting: config, observability, lifecycle, admin
//! ```

use std::path::PathBuf;

use clap::Parser;

use doh_relay::config::{load_config, RelayConfig};
use doh_relay::lifecycle::{signals, start, Shutdown};
use doh_relay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "doh-relay", version)]
#[command(about = "DNS-over-HTTPS relay with weighted upstream failover", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Built-in defaults are used if omitted.
    #[arg(short, long, env = "DOH_RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "doh-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        path = %config.relay.path,
        attempt_timeout_ms = config.upstream.attempt_timeout_ms,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let server = start(config, &shutdown);
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = signals::wait_for_signal() => {
            shutdown.trigger();
            server.await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
