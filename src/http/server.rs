//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay endpoint
//! - Wire up middleware (request ID, tracing)
//! - Derive the client key and hand requests to the relay core
//! - Run background tasks (rate limit sweeper) alongside the listener
//! - Graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::{client_key, request_id, UuidRequestId};
use crate::relay::{RelayBuildError, RelayCore};
use crate::security::rate_limit::spawn_sweeper;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayCore>,
    pub client_ip_header: Option<String>,
}

/// HTTP server for the DoH relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    relay: Arc<RelayCore>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, RelayBuildError> {
        let relay = Arc::new(RelayCore::from_config(&config)?);
        Ok(Self::with_relay(config, relay))
    }

    /// Create a server around an already assembled relay core.
    pub fn with_relay(config: RelayConfig, relay: Arc<RelayCore>) -> Self {
        let state = AppState {
            relay: relay.clone(),
            client_ip_header: config.relay.client_ip_header.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config, relay }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.relay.path, any(relay_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.relay.path,
            providers = self.relay.registry().len(),
            "HTTP server starting"
        );

        let sweeper = self.relay.limiter().cloned().map(|limiter| {
            spawn_sweeper(
                limiter,
                Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
                shutdown.resubscribe(),
            )
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        // The sweeper may have subscribed after the signal was sent.
        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Shared relay core, for the admin API.
    pub fn relay(&self) -> Arc<RelayCore> {
        self.relay.clone()
    }
}

/// Relay endpoint handler.
async fn relay_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let key = client_key(request.headers(), peer, state.client_ip_header.as_deref());
    let request_id = request_id(request.headers()).to_string();

    state.relay.handle(&key, &request_id, request).await
}
