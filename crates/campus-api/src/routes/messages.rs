use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use campus_persist::{Message, MessageContent, MessageType, NewMessage};

use crate::{
    error::{ApiError, ApiResult},
    extract::JsonBody,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub content: Option<Value>,
    pub message_type: Option<String>,
    pub user_id: Option<String>,
    pub reply_to_message_id: Option<String>,
    pub concept_tags: Option<Vec<String>>,
}

fn parse_message_type(raw: &str) -> Option<MessageType> {
    match raw {
        "text" => Some(MessageType::Text),
        "code" => Some(MessageType::Code),
        _ => None,
    }
}

fn validate_content(
    content: Option<Value>,
    message_type: Option<String>,
) -> ApiResult<MessageContent> {
    let (content, message_type) = match (content, message_type) {
        (Some(c), Some(t)) if !c.is_null() => (c, t),
        _ => {
            return Err(ApiError::BadRequest(
                "content and messageType are required".to_string(),
            ))
        }
    };

    let message_type = parse_message_type(&message_type).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "messageType must be \"text\" or \"code\", got \"{}\"",
            message_type
        ))
    })?;

    let content: MessageContent = serde_json::from_value(content).map_err(|_| {
        ApiError::BadRequest(
            "content must be {\"text\"} or {\"code\", \"language\"}".to_string(),
        )
    })?;

    if content.kind() != message_type {
        return Err(ApiError::BadRequest(
            "content does not match messageType".to_string(),
        ));
    }
    if content.is_blank() {
        return Err(ApiError::BadRequest("content must not be empty".to_string()));
    }

    Ok(content)
}

/// Messages of a conversation, oldest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = state.store.list_messages(&conversation_id).await?;
    Ok(Json(messages))
}

/// Post a message to a conversation
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    JsonBody(req): JsonBody<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let content = validate_content(req.content, req.message_type)?;

    let user_id = req
        .user_id
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| state.current_user_id().to_string());

    let new = NewMessage {
        id: state.ids.next_id(),
        conversation_id,
        user_id,
        content,
        timestamp: Utc::now(),
        reply_to_message_id: req.reply_to_message_id,
        concept_tags: req.concept_tags,
    };
    let message = state.store.insert_message(new).await?;

    tracing::info!(
        message_id = %message.id,
        conversation_id = %message.conversation_id,
        "Message created"
    );
    Ok((StatusCode::CREATED, Json(message)))
}
