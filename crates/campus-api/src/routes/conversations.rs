use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use campus_persist::{Conversation, NewConversation};

use crate::{
    error::{required, ApiResult},
    extract::JsonBody,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub title: Option<String>,
    pub participant_ids: Option<Vec<String>>,
    #[serde(default)]
    pub concept_tags: Vec<String>,
}

/// All conversations of a thread
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Vec<Conversation>>> {
    let conversations = state.store.list_conversations(&thread_id).await?;
    Ok(Json(conversations))
}

/// Start a conversation in a thread
///
/// Without participants the current user is the sole participant.
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    JsonBody(req): JsonBody<CreateConversationRequest>,
) -> ApiResult<(StatusCode, Json<Conversation>)> {
    let title = required(req.title, "title")?;

    let participant_ids = match req.participant_ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => vec![state.current_user_id().to_string()],
    };

    let new = NewConversation {
        title,
        participant_ids,
        concept_tags: req.concept_tags,
    };
    let conversation = Conversation::from_new(state.ids.next_id(), thread_id, new, Utc::now());
    let conversation = state.store.insert_conversation(conversation).await?;

    tracing::info!(
        conversation_id = %conversation.id,
        thread_id = %conversation.thread_id,
        "Conversation created"
    );
    Ok((StatusCode::CREATED, Json(conversation)))
}
