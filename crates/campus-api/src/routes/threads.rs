use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use campus_persist::{NewThread, Thread, ThreadFilter, ThreadUpdate};

use crate::{
    error::{required, ApiError, ApiResult},
    extract::JsonBody,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub parent_thread_id: Option<String>,
    #[serde(default)]
    pub related_course_ids: Vec<String>,
    pub active: Option<bool>,
    #[serde(default)]
    pub concept_tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListThreadsQuery {
    pub parent_thread_id: Option<String>,
    pub active: Option<bool>,
}

/// List threads, optionally by parent or active flag
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListThreadsQuery>,
) -> ApiResult<Json<Vec<Thread>>> {
    let filter = ThreadFilter {
        parent_thread_id: query.parent_thread_id,
        active: query.active,
    };
    let threads = state.store.list_threads(&filter).await?;
    Ok(Json(threads))
}

/// Create a thread, linking it under its parent when one is given
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateThreadRequest>,
) -> ApiResult<(StatusCode, Json<Thread>)> {
    let name = required(req.name, "name")?;

    let new = NewThread {
        name,
        description: req.description,
        parent_thread_id: req.parent_thread_id,
        related_course_ids: req.related_course_ids,
        active: req.active.unwrap_or(true),
        concept_tags: req.concept_tags,
    };
    let thread = Thread::from_new(state.ids.next_id(), new, Utc::now());
    let thread = state.store.insert_thread(thread).await?;

    tracing::info!(thread_id = %thread.id, "Thread created");
    Ok((StatusCode::CREATED, Json(thread)))
}

/// Get a specific thread by ID
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Thread>> {
    let thread = state
        .store
        .get_thread(&thread_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Thread not found: {}", thread_id)))?;

    Ok(Json(thread))
}

/// Merge a partial update into a thread
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    JsonBody(update): JsonBody<ThreadUpdate>,
) -> ApiResult<Json<Thread>> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }

    let thread = state.store.update_thread(&thread_id, update).await?;
    tracing::info!(thread_id = %thread.id, "Thread updated");
    Ok(Json(thread))
}

/// Delete a thread
///
/// Conversations and messages of the thread are not removed.
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete_thread(&thread_id).await?;
    tracing::info!(thread_id = %thread_id, "Thread deleted");
    Ok(StatusCode::NO_CONTENT)
}
