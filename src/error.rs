use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-level error taxonomy. Every handler error is converted to a
/// JSON `{"error": message}` body at the boundary; internal detail stays
/// in the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing fields")]
    MissingFields,
    #[error("Invalid birthdate")]
    InvalidBirthdate,
    #[error("Malformed request body")]
    MalformedBody,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields | ApiError::InvalidBirthdate | ApiError::MalformedBody => {
                StatusCode::BAD_REQUEST
            }
            ApiError::EmailTaken => StatusCode::CONFLICT,
            ApiError::InvalidCredentials | ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref e) = self {
            error!(error = ?e, "internal server error");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        // 23505 = unique_violation; the email constraint is the second line
        // of defense behind the pre-insert existence check.
        if let Some(db) = e.as_database_error() {
            if db.code().as_deref() == Some("23505") {
                return ApiError::EmailTaken;
            }
        }
        ApiError::Internal(e.into())
    }
}

impl From<MultipartError> for ApiError {
    fn from(_: MultipartError) -> Self {
        ApiError::MalformedBody
    }
}
