//! API error type and its HTTP mapping

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linkstash_db::StoreError;
use linkstash_types::LinkInputError;
use linkstash_types::api::ErrorResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Username already taken")]
    DuplicateUser,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Link not found")]
    LinkNotFound,

    #[error("Link already saved")]
    DuplicateUrl,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateUser | ApiError::DuplicateUrl => StatusCode::CONFLICT,
            ApiError::UserNotFound | ApiError::LinkNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials | ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Unavailable(msg) => {
                tracing::warn!("Backing store unavailable: {}", msg);
                "Service temporarily unavailable".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::InvalidInput(input) => ApiError::from(input),
            StoreError::DuplicateUser(_) => ApiError::DuplicateUser,
            StoreError::UserNotFound(_) => ApiError::UserNotFound,
            StoreError::LinkNotFound(_) => ApiError::LinkNotFound,
            StoreError::DuplicateUrl(_) => ApiError::DuplicateUrl,
            StoreError::Conflict(_) | StoreError::Unavailable(_) => ApiError::Unavailable(message),
            StoreError::Corrupt(_) => ApiError::Internal(message),
        }
    }
}

impl From<LinkInputError> for ApiError {
    fn from(e: LinkInputError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Validation(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::Validation(e.body_text())
    }
}
