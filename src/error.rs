use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("document not found")]
    DocumentNotFound,
    #[error("attachment not found")]
    AttachmentNotFound,
    #[error("file not found")]
    BlobNotFound,
    #[error("duplicate attachment")]
    DuplicateAttachment,
    #[error("content has expired")]
    Expired,
    #[error("content exceeds maximum allowed size ({len} > {max} bytes)")]
    ContentTooLarge { len: usize, max: usize },
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
    #[error("file cannot be empty")]
    EmptyFile,
    #[error("file exceeds maximum allowed size ({size} > {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Whether the error was caused by the caller rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Internal)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::DocumentNotFound | Self::AttachmentNotFound | Self::BlobNotFound => StatusCode::NOT_FOUND,
            Self::DuplicateAttachment => StatusCode::CONFLICT,
            Self::Expired => StatusCode::GONE,
            Self::ContentTooLarge { .. } | Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidFileName(_) | Self::EmptyFile | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if self.is_client_error() {
            tracing::debug!(error = %self, status = %status.as_u16(), "Request rejected");
            self.to_string()
        } else {
            tracing::error!(error = %self, "Internal server error occurred");
            "Internal server error".to_string()
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

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::DocumentNotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::DuplicateAttachment.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Expired.into_response().status(), StatusCode::GONE);
        assert_eq!(AppError::EmptyFile.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::FileTooLarge { size: 2, max: 1 }.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(AppError::Storage("boom".into()).into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_errors_are_not_client_errors() {
        assert!(!AppError::Storage("disk".into()).is_client_error());
        assert!(!AppError::Internal.is_client_error());
        assert!(AppError::Expired.is_client_error());
    }
}
