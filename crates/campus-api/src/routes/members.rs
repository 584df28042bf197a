use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use campus_persist::{MemberRole, ThreadMember, User};

use crate::{
    error::{required, ApiError, ApiResult},
    extract::JsonBody,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Option<String>,
    pub role: Option<MemberRole>,
}

async fn lookup_user(state: &AppState, user_id: &str) -> ApiResult<User> {
    state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", user_id)))
}

/// Members of a thread; unknown threads have none
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Vec<ThreadMember>>> {
    let members = state.store.list_members(&thread_id).await?;
    Ok(Json(members))
}

/// Add a user from the user table to a thread
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    JsonBody(req): JsonBody<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ThreadMember>)> {
    let user_id = required(req.user_id, "userId")?;
    let user = lookup_user(&state, &user_id).await?;

    let member = ThreadMember::for_user(&user, req.role.unwrap_or_default(), Utc::now());
    let member = state.store.add_member(&thread_id, member).await?;

    tracing::info!(thread_id = %thread_id, user_id = %member.id, role = ?member.role, "Member added");
    Ok((StatusCode::CREATED, Json(member)))
}

/// The current user joins a thread as a plain member
pub async fn join_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<(StatusCode, Json<ThreadMember>)> {
    let user = lookup_user(&state, state.current_user_id()).await?;

    let member = ThreadMember::for_user(&user, MemberRole::Member, Utc::now());
    let member = state.store.add_member(&thread_id, member).await?;

    tracing::info!(thread_id = %thread_id, user_id = %member.id, "Joined thread");
    Ok((StatusCode::CREATED, Json(member)))
}

/// The current user leaves a thread
pub async fn leave_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadMember>> {
    let removed = state
        .store
        .remove_member(&thread_id, state.current_user_id())
        .await?;

    tracing::info!(thread_id = %thread_id, user_id = %removed.id, "Left thread");
    Ok(Json(removed))
}
