use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campus_persist::PersistError;
use serde_json::json;
use thiserror::Error;

use crate::cache::CacheError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persist(PersistError),

    #[error("Cache error: {0}")]
    Cache(CacheError),

    #[error("Internal server error")]
    Internal,
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ThreadNotFound(_)
            | PersistError::ConversationNotFound(_)
            | PersistError::MessageNotFound(_)
            | PersistError::UserNotFound(_)
            | PersistError::MemberNotFound { .. } => ApiError::NotFound(err.to_string()),
            PersistError::MemberExists { .. } => ApiError::Conflict(err.to_string()),
            PersistError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Persist(other),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::InvalidExpiration(msg) => ApiError::BadRequest(msg),
            other => ApiError::Cache(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Persist(_) | ApiError::Cache(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(_) | ApiError::NotFound(_) | ApiError::Conflict(_) => {
                self.to_string()
            }
            ApiError::Persist(e) => {
                tracing::error!("Persistence error: {}", e);
                "Storage error".to_string()
            }
            ApiError::Cache(e) => {
                tracing::error!("Cache error: {}", e);
                "Cache error".to_string()
            }
            ApiError::Internal => {
                tracing::error!("Internal error");
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Reject a missing or blank required string field
pub fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{} is required", field))),
    }
}
