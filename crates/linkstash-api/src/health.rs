use axum::{Json, extract::State};
use linkstash_types::api::HealthResponse;
use tracing::warn;

use crate::state::{AppState, blocking};

/// GET /api/health
///
/// Always 200; a failing store shows up in `storeStatus`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.health.backend_name().to_string();
    let environment = state.environment.clone();

    let health = state.health.clone();
    let ping = blocking(move || Ok(health.ping()?)).await;

    let (status, store_status) = match ping {
        Ok(()) => ("ok", "connected".to_string()),
        Err(e) => {
            warn!("Health check: store {} unreachable: {}", store, e);
            ("degraded", "unavailable".to_string())
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        environment,
        store_status,
        store,
    })
}
