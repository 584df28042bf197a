use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::ApiError;

/// JSON request body whose rejections are reported as `ApiError::BadRequest`
///
/// A missing content type, malformed JSON or a mistyped field all produce a
/// 400 with the usual `{"error": ...}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
