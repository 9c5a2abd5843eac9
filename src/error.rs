use crate::middleware::error_handling;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        error_handling::into_response(self.clone())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("message not found")]
    MessageNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("store error: {0}")]
    Database(String),

    #[error("internal server error")]
    Internal,

    #[error("edit window expired (created_at: {created_at}, max_edit_minutes: {max_edit_minutes})")]
    EditWindowExpired {
        created_at: chrono::DateTime<chrono::Utc>,
        max_edit_minutes: i64,
    },

    #[error(
        "delete window expired (created_at: {created_at}, max_delete_minutes: {max_delete_minutes})"
    )]
    DeleteWindowExpired {
        created_at: chrono::DateTime<chrono::Utc>,
        max_delete_minutes: i64,
    },
}

// NOTE: No need to implement From<AppError> for actix_web::Error
// because actix-web provides a blanket impl for all ResponseError types:
// impl<T: ResponseError + 'static> From<T> for actix_web::Error

impl AppError {
    /// Returns whether this error is retryable (e.g., a transient store failure)
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal)
    }

    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::Unauthorized => 401,
            AppError::Forbidden => 403,
            AppError::MessageNotFound | AppError::UserNotFound => 404,
            // Window expiry is an authorization failure, but with its own code
            // so clients can distinguish it from a plain Forbidden.
            AppError::EditWindowExpired { .. } | AppError::DeleteWindowExpired { .. } => 403,
            AppError::Database(_) | AppError::Internal => 500,
            _ => 500,
        }
    }
}

/// Unified API error response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Human-readable explanation.
    pub message: String,

    /// HTTP status code.
    pub status: u16,

    /// Error category for client-side routing:
    /// "validation_error", "authentication_error", "authorization_error",
    /// "not_found_error", "server_error".
    pub error_type: String,

    /// Stable error code for client localization and tracking,
    /// e.g. "MESSAGE_NOT_FOUND", "EDIT_WINDOW_EXPIRED".
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Request trace id for log correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            details: None,
            trace_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

/// Stable error codes surfaced to clients.
pub mod error_codes {
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const MESSAGE_NOT_FOUND: &str = "MESSAGE_NOT_FOUND";
    pub const NOT_CONVERSATION_MEMBER: &str = "NOT_CONVERSATION_MEMBER";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const EDIT_WINDOW_EXPIRED: &str = "EDIT_WINDOW_EXPIRED";
    pub const DELETE_WINDOW_EXPIRED: &str = "DELETE_WINDOW_EXPIRED";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

/// Standard error categories.
pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const AUTHORIZATION_ERROR: &str = "authorization_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const SERVER_ERROR: &str = "server_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized.status_code(), 401);
        assert_eq!(AppError::Forbidden.status_code(), 403);
        assert_eq!(AppError::MessageNotFound.status_code(), 404);
        assert_eq!(
            AppError::EditWindowExpired {
                created_at: chrono::Utc::now(),
                max_edit_minutes: 15,
            }
            .status_code(),
            403
        );
        assert_eq!(AppError::Database("down".into()).status_code(), 500);
    }

    #[test]
    fn test_window_expiry_is_not_retryable() {
        let err = AppError::DeleteWindowExpired {
            created_at: chrono::Utc::now(),
            max_delete_minutes: 60,
        };
        assert!(!err.is_retryable());
        assert!(AppError::Database("timeout".into()).is_retryable());
    }

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new(
            "Not Found",
            "message not found",
            404,
            error_types::NOT_FOUND_ERROR,
            error_codes::MESSAGE_NOT_FOUND,
        );

        assert_eq!(error.status, 404);
        assert_eq!(error.error_type, error_types::NOT_FOUND_ERROR);
        assert_eq!(error.code, error_codes::MESSAGE_NOT_FOUND);
        assert!(error.details.is_none());
    }

    #[test]
    fn test_error_response_with_details() {
        let error = ErrorResponse::new(
            "Bad Request",
            "empty message",
            400,
            error_types::VALIDATION_ERROR,
            error_codes::INVALID_REQUEST,
        )
        .with_details("text or image_url is required".to_string());

        assert!(error.details.is_some());
    }
}
