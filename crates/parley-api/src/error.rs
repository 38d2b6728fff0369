use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use parley_db::DbError;
use parley_types::api::ErrorResponse;

/// Request-terminal failures. Each maps to one HTTP status and a JSON body of
/// the form `{"success": false, "error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, blank or malformed input.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness rule rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("Invalid email or password")]
    Auth,

    #[error("{0}")]
    NotFound(String),

    #[error("Unsupported operation")]
    UnsupportedOperation,

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UnsupportedOperation => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                error!("{}", self);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Trimmed value of a required text field.
pub(crate) fn required_text<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

pub(crate) fn required_id(value: Option<i64>, field: &str) -> Result<i64, ApiError> {
    value.ok_or_else(|| ApiError::validation(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_taxonomy() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Auth.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::UnsupportedOperation.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("  bob ", "username").unwrap(), "bob");
        let err = required_text(" \t", "username").unwrap_err();
        assert_eq!(err.to_string(), "username is required");
    }

    #[test]
    fn required_id_reports_field() {
        assert_eq!(required_id(Some(4), "user_id").unwrap(), 4);
        assert_eq!(
            required_id(None, "friend_id").unwrap_err().to_string(),
            "friend_id is required"
        );
    }
}
