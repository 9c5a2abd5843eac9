use crate::error::{error_codes, error_types, AppError, ErrorResponse};
use actix_web::{http::StatusCode, HttpResponse};

/// Map domain errors to HTTP responses.
pub fn map_error(err: &AppError) -> (StatusCode, ErrorResponse) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (error_type, code) = match err {
        AppError::BadRequest(_) => (
            error_types::VALIDATION_ERROR,
            error_codes::INVALID_REQUEST,
        ),
        AppError::Unauthorized => (
            error_types::AUTHENTICATION_ERROR,
            error_codes::INVALID_CREDENTIALS,
        ),
        AppError::Forbidden => (
            error_types::AUTHORIZATION_ERROR,
            error_codes::NOT_CONVERSATION_MEMBER,
        ),
        AppError::MessageNotFound => (
            error_types::NOT_FOUND_ERROR,
            error_codes::MESSAGE_NOT_FOUND,
        ),
        AppError::UserNotFound => (error_types::NOT_FOUND_ERROR, error_codes::USER_NOT_FOUND),
        AppError::EditWindowExpired { .. } => (
            error_types::AUTHORIZATION_ERROR,
            error_codes::EDIT_WINDOW_EXPIRED,
        ),
        AppError::DeleteWindowExpired { .. } => (
            error_types::AUTHORIZATION_ERROR,
            error_codes::DELETE_WINDOW_EXPIRED,
        ),
        AppError::Database(_) => (error_types::SERVER_ERROR, error_codes::DATABASE_ERROR),
        AppError::Config(_) | AppError::StartServer(_) | AppError::Internal => (
            error_types::SERVER_ERROR,
            error_codes::INTERNAL_SERVER_ERROR,
        ),
    };

    let message = err.to_string();
    let response = ErrorResponse::new(
        match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        },
        &message,
        status.as_u16(),
        error_type,
        code,
    );

    (status, response)
}

pub fn into_response(err: AppError) -> HttpResponse {
    let (status, response) = map_error(&err);
    HttpResponse::build(status).json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_expiry_maps_to_distinct_code() {
        let (status, body) = map_error(&AppError::EditWindowExpired {
            created_at: chrono::Utc::now(),
            max_edit_minutes: 15,
        });
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.code, error_codes::EDIT_WINDOW_EXPIRED);

        let (status, body) = map_error(&AppError::Forbidden);
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.code, error_codes::NOT_CONVERSATION_MEMBER);
    }

    #[test]
    fn test_store_failure_maps_to_server_error() {
        let (status, body) = map_error(&AppError::Database("primary unreachable".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error_type, error_types::SERVER_ERROR);
        assert_eq!(body.code, error_codes::DATABASE_ERROR);
    }
}
