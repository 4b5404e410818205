use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::clients::converter::ConversionError;
use crate::clients::parser::ParserError;
use crate::pipeline::FieldError;
use crate::render::RenderError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("PDF conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("CV parser error: {0}")]
    Parser(#[from] ParserError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: Vec<FieldError>) -> Self {
        AppError::Validation {
            message: "Please pass a valid JSON object in the body".to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = Vec::new();
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Validation {
                message,
                details: errors,
            } => {
                details = errors;
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
            }
            AppError::Unauthorized(e) => {
                tracing::warn!("Rejected request: {e}");
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Authentication required".to_string(),
                )
            }
            AppError::Storage(StorageError::NotFound(path)) => {
                tracing::error!("Blob not found: {path}");
                (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "A required file could not be found".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Conversion(e) => {
                tracing::error!("PDF conversion error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "CONVERSION_ERROR",
                    "PDF conversion failed".to_string(),
                )
            }
            AppError::Parser(e) => {
                tracing::error!("CV parser error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PARSER_ERROR",
                    "CV parsing failed".to_string(),
                )
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "The document could not be generated".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if !details.is_empty() {
            error["details"] = json!(details);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
