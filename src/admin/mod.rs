//! Admin API.
//!
//! # Responsibilities
//! - Report build version, relay path and provider count
//! - List providers with their weights and traffic shares
//! - Expose terminal-state counters and limiter size
//!
//! # Design Decisions
//! - Served on its own listener, never on the public relay port
//! - Every route requires the configured bearer token

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::relay::RelayCore;

/// State shared by the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub relay: Arc<RelayCore>,
    pub api_key: String,
    pub relay_path: String,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/providers", get(get_providers))
        .route("/admin/stats", get(get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve_admin(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
