//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError as DeliveryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] gachadex_core::EmailError),

    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] gachadex_core::UsernameError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Submitted code is not six digits.
    #[error("invalid code format: {0}")]
    MalformedCode(#[from] gachadex_core::CodeError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// One-time code wrong, expired, already used, or never issued.
    #[error("invalid or expired code")]
    InvalidCode,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Email or username already registered. Holds the field name.
    #[error("{0} already registered")]
    UserAlreadyExists(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// The login code could not be delivered.
    #[error("code delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
