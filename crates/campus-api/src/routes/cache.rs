use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{required, ApiError, ApiResult},
    extract::JsonBody,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CacheQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryResponse {
    pub key: String,
    pub data: Value,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetCacheRequest {
    pub key: Option<String>,
    #[serde(default)]
    pub data: Value,
    /// Seconds until expiry
    pub expiration: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCacheResponse {
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn get_cached(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CacheQuery>,
) -> ApiResult<Json<CacheEntryResponse>> {
    let key = required(query.key, "key")?;

    let entry = state
        .cache
        .get(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cache key not found: {}", key)))?;

    Ok(Json(CacheEntryResponse {
        key,
        data: entry.data,
        expires_at: entry.expires_at,
    }))
}

pub async fn set_cached(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SetCacheRequest>,
) -> ApiResult<(StatusCode, Json<SetCacheResponse>)> {
    let key = required(req.key, "key")?;

    let ttl = match req.expiration {
        Some(0) => {
            return Err(ApiError::BadRequest(
                "expiration must be greater than zero".to_string(),
            ))
        }
        Some(secs) => Duration::from_secs(secs),
        None => state.config.cache.default_expiration(),
    };

    let entry = state.cache.set(key.clone(), req.data, ttl).await?;
    tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache entry stored");

    Ok((
        StatusCode::CREATED,
        Json(SetCacheResponse {
            key,
            expires_at: entry.expires_at,
        }),
    ))
}
