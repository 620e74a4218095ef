use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::media_service::MediaError;
use crate::utils::validation::ValidationError;

const GENERIC_MESSAGE: &str = "Internal Server Error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    /// Message is already redacted for the current environment
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps pipeline errors to HTTP errors. Storage details only leak when `expose_details`.
    pub fn from_media(err: MediaError, expose_details: bool) -> Self {
        match err {
            MediaError::Validation(e) => e.into(),
            MediaError::NotFound(filename) => AppError::NotFound(format!("File not found: {}", filename)),
            MediaError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                if expose_details {
                    AppError::Storage(e.to_string())
                } else {
                    AppError::Storage(GENERIC_MESSAGE.to_string())
                }
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::StorageError;

    fn storage_error() -> MediaError {
        MediaError::Storage(StorageError::Io {
            op: "write",
            root: "serving (/srv/uploads)".to_string(),
            filename: "image-1-1.jpg".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }

    #[test]
    fn test_storage_error_redacted_in_production() {
        match AppError::from_media(storage_error(), false) {
            AppError::Storage(msg) => assert_eq!(msg, GENERIC_MESSAGE),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_storage_error_detailed_in_development() {
        match AppError::from_media(storage_error(), true) {
            AppError::Storage(msg) => {
                assert!(msg.contains("image-1-1.jpg"));
                assert!(msg.contains("denied"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Storage("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
