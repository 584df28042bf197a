use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Always answers 200; a failing store shows up as `degraded`.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = HashMap::new();

    let store_ok = match state.store.ping().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };
    services.insert(
        "store".to_string(),
        if store_ok { "connected" } else { "disconnected" }.to_string(),
    );
    services.insert("cache".to_string(), "available".to_string());

    Json(HealthResponse {
        status: if store_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
