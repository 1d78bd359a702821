use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::relay::StatsSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub relay_path: String,
    pub providers: usize,
    pub rate_limit_enabled: bool,
}

#[derive(Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub url: String,
    pub weight: u32,
    pub category: String,
    pub description: String,
    /// Fraction of first picks this provider receives.
    pub share: f64,
}

#[derive(Serialize)]
pub struct RelaySummary {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub rate_limit_entries: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        relay_path: state.relay_path.clone(),
        providers: state.relay.registry().len(),
        rate_limit_enabled: state.relay.limiter().is_some(),
    })
}

pub async fn get_providers(State(state): State<AdminState>) -> Json<Vec<ProviderStatus>> {
    let registry = state.relay.registry();
    let total = registry.total_weight() as f64;

    let statuses = registry
        .iter()
        .map(|p| ProviderStatus {
            name: p.name.clone(),
            url: p.url.to_string(),
            weight: p.weight.get(),
            category: p.category.clone(),
            description: p.description.clone(),
            share: f64::from(p.weight.get()) / total,
        })
        .collect();

    Json(statuses)
}

pub async fn get_stats(State(state): State<AdminState>) -> Json<RelaySummary> {
    Json(RelaySummary {
        stats: state.relay.stats(),
        rate_limit_entries: state
            .relay
            .limiter()
            .map(|l| l.tracked_keys())
            .unwrap_or(0),
    })
}
