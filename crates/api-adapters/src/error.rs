//! Maps domain failures to HTTP responses.
//!
//! Not-found conditions are 404 with `{"message": ...}`. Conflicts are 409
//! and carry the entity that already exists. Bad input is 400. Storage
//! failures are logged and answered with a generic 500.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DomainError::Validation(format!("invalid request body: {}", rejection.body_text())))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(DomainError::Validation(format!("invalid query: {}", rejection.body_text())))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(DomainError::Validation(format!("invalid path: {}", rejection.body_text())))
    }
}

fn message(status: StatusCode, text: String) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        match err {
            DomainError::UserConflict(users) => (StatusCode::CONFLICT, Json(users)).into_response(),
            DomainError::ForumConflict(forum) => (StatusCode::CONFLICT, Json(*forum)).into_response(),
            DomainError::ThreadConflict(thread) => {
                (StatusCode::CONFLICT, Json(*thread)).into_response()
            }
            DomainError::EmailTaken(_) | DomainError::ParentNotInThread { .. } => {
                message(StatusCode::CONFLICT, err.to_string())
            }
            DomainError::InvalidSortMode(_) | DomainError::Validation(_) => {
                message(StatusCode::BAD_REQUEST, err.to_string())
            }
            DomainError::StorageFailure(detail) => {
                tracing::error!(error = %detail, "storage failure");
                message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            err if err.is_not_found() => message(StatusCode::NOT_FOUND, err.to_string()),
            err => {
                tracing::error!(error = %err, "unmapped domain error");
                message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}
