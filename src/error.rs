use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Token not found - covers never-issued and already-redeemed tokens
    /// alike, so replay probing learns nothing.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Bad webhook signature")]
    BadSignature,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Failure from the external payment API. Not retried here - the
    /// processor owns retry of webhook delivery.
    #[error("Payment processor error: {0}")]
    Processor(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Unauthorized", Some("invalid token".to_string()))
            }
            AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "Unauthorized", Some("token expired".to_string()))
            }
            AppError::BadSignature => {
                (StatusCode::BAD_REQUEST, "Invalid signature", None)
            }
            AppError::MalformedPayload(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid payload", Some(msg.clone()))
            }
            AppError::Processor(msg) => {
                // Upstream message passed through for operator diagnosis
                tracing::error!("Payment processor error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Payment processor error", Some(msg.clone()))
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
