//! Error types for canvass.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    #[error("Response not found: {0}")]
    ResponseNotFound(String),

    #[error("Activity is not accepting responses (status: {0})")]
    ActivityNotAcceptingResponses(String),

    #[error("This activity does not allow guest submissions")]
    GuestsNotAllowed,

    #[error("Response already submitted{}", format_submitted_at(.0))]
    AlreadySubmitted(Option<String>),

    #[error("Cannot update a submitted response")]
    ResponseAlreadySubmitted,

    #[error("Please answer all required questions")]
    MissingRequiredQuestions(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // === Server Errors ===
    #[error("Failed to save response: {0}")]
    SaveFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_submitted_at(submitted_at: &Option<String>) -> String {
    submitted_at
        .as_ref()
        .map(|at| format!(" at {at}"))
        .unwrap_or_default()
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::ActivityNotFound(_) | Self::ResponseNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::ActivityNotAcceptingResponses(_) | Self::GuestsNotAllowed => {
                StatusCode::FORBIDDEN
            }
            Self::AlreadySubmitted(_) => StatusCode::CONFLICT,
            Self::ResponseAlreadySubmitted | Self::BadRequest(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MissingRequiredQuestions(_) => StatusCode::UNPROCESSABLE_ENTITY,

            // 5xx Server Errors
            Self::SaveFailed(_) | Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::ActivityNotFound(_) => "ACTIVITY_NOT_FOUND",
            Self::ResponseNotFound(_) => "RESPONSE_NOT_FOUND",
            Self::ActivityNotAcceptingResponses(_) => "ACTIVITY_NOT_ACCEPTING_RESPONSES",
            Self::GuestsNotAllowed => "GUESTS_NOT_ALLOWED",
            Self::AlreadySubmitted(_) => "ALREADY_SUBMITTED",
            Self::ResponseAlreadySubmitted => "RESPONSE_ALREADY_SUBMITTED",
            Self::MissingRequiredQuestions(_) => "MISSING_REQUIRED_QUESTIONS",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::SaveFailed(_) => "SAVE_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let mut error = json!({
            "code": code,
            "message": self.to_string(),
        });

        // Attach the missing question ids so the UI can highlight them
        if let Self::MissingRequiredQuestions(ref missing) = self
            && let Some(obj) = error.as_object_mut()
        {
            obj.insert("missing_questions".to_string(), json!(missing));
        }

        let body = Json(json!({ "error": error }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ActivityNotAcceptingResponses("draft".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::GuestsNotAllowed.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::AlreadySubmitted(None).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ResponseAlreadySubmitted.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MissingRequiredQuestions(vec!["q1".to_string()]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::SaveFailed("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::ResponseNotFound("abc".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            AppError::MissingRequiredQuestions(vec![]).error_code(),
            "MISSING_REQUIRED_QUESTIONS"
        );
        assert_eq!(AppError::AlreadySubmitted(None).error_code(), "ALREADY_SUBMITTED");
        assert_eq!(
            AppError::ResponseAlreadySubmitted.error_code(),
            "RESPONSE_ALREADY_SUBMITTED"
        );
        assert_eq!(AppError::GuestsNotAllowed.error_code(), "GUESTS_NOT_ALLOWED");
    }

    #[test]
    fn test_already_submitted_message_includes_timestamp() {
        let err = AppError::AlreadySubmitted(Some("2026-08-01T10:00:00Z".to_string()));
        assert!(err.to_string().contains("2026-08-01T10:00:00Z"));

        let err = AppError::AlreadySubmitted(None);
        assert_eq!(err.to_string(), "Response already submitted");
    }
}
