//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{"error": "<message>", "reason": "<code>"}` where
//! `reason` is a stable machine-readable code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::capture::CaptureError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Draw or capture failed.
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub reason: &'static str,
}

impl AppError {
    /// Whether this error is the server's fault and should reach Sentry.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Auth(
                    AuthError::Repository(_) | AuthError::Delivery(_) | AuthError::PasswordHash
                )
                | Self::Capture(CaptureError::Repository(_))
        )
    }

    fn status_and_reason(&self) -> (StatusCode, &'static str) {
        if self.is_server_error() {
            return (StatusCode::INTERNAL_SERVER_ERROR, "internal");
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_)
                | AuthError::WeakPassword(_)
                | AuthError::MalformedCode(_) => (StatusCode::BAD_REQUEST, "validation"),
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
                AuthError::InvalidCode => (StatusCode::UNAUTHORIZED, "invalid_code"),
                AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "unauthorized"),
                AuthError::UserAlreadyExists(_) => (StatusCode::CONFLICT, "conflict"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::Capture(err) => match err {
                CaptureError::InsufficientCredits { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_credits")
                }
                CaptureError::Draw(_) => (StatusCode::CONFLICT, "no_item_for_rarity"),
                CaptureError::InvalidItem(_) => (StatusCode::BAD_REQUEST, "invalid_item"),
                CaptureError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
                CaptureError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Self::Database(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn public_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid username or password".to_string(),
                AuthError::InvalidCode => "Invalid or expired code".to_string(),
                AuthError::UserNotFound => "Not logged in".to_string(),
                AuthError::UserAlreadyExists(field) => {
                    format!("An account with this {field} already exists")
                }
                other => other.to_string(),
            },
            Self::Capture(CaptureError::InsufficientCredits { .. }) => {
                "Not enough pokéballs".to_string()
            }
            Self::Capture(err) => err.to_string(),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, reason) = self.status_and_reason();
        let body = ErrorBody {
            error: self.public_message(),
            reason,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
