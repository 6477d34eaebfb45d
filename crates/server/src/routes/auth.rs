//! Authentication route handlers.
//!
//! JSON endpoints for registration, password login, the emailed second
//! factor, and logout.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use gachadex_core::UserId;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, Profile, User};
use crate::routes::ApiJson;
use crate::routes::account::load_profile;
use crate::services::auth::LoginOutcome;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Registration response body.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub requires_two_factor: bool,
    pub user_id: UserId,
    pub user: Profile,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response body.
///
/// Carries `user_id` when a code is pending and `user` once logged in.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub requires_two_factor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Profile>,
}

/// Second-factor request body.
#[derive(Debug, Deserialize)]
pub struct VerifyTwoFactorRequest {
    pub user_id: UserId,
    pub code: String,
}

/// Body returned once a session is established.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Profile,
}

/// Logout response body.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account.
///
/// POST /api/auth/register
///
/// The account starts with the second factor on, so no session is created
/// here; the emailed code completes the first login.
///
/// # Errors
///
/// Returns 400 for invalid input, 409 if the email or username is taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let user = state
        .auth()
        .register(&req.email, &req.username, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            requires_two_factor: user.two_factor_enabled,
            user_id: user.id,
            user: Profile::new(user, Vec::new()),
        }),
    ))
}

/// Check a username and password.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 `invalid_credentials` for any bad username/password pair.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    match state.auth().login(&req.username, &req.password).await? {
        LoginOutcome::TwoFactorRequired { user_id } => {
            tracing::info!(user_id = %user_id, "Login code sent");
            Ok(Json(LoginResponse {
                requires_two_factor: true,
                user_id: Some(user_id),
                user: None,
            }))
        }
        LoginOutcome::Authenticated(user) => {
            start_session(&session, &user).await?;
            let profile = load_profile(&state, user).await?;
            Ok(Json(LoginResponse {
                requires_two_factor: false,
                user_id: None,
                user: Some(profile),
            }))
        }
    }
}

/// Finish a login with the emailed code.
///
/// POST /api/auth/verify-2fa
///
/// # Errors
///
/// Returns 400 for a code that is not six digits and 401 `invalid_code` for
/// every other rejection.
pub async fn verify_two_factor(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<VerifyTwoFactorRequest>,
) -> Result<Json<SessionResponse>> {
    let user = state
        .auth()
        .verify_two_factor(req.user_id, &req.code)
        .await
        .inspect_err(|e| tracing::info!(user_id = %req.user_id, error = %e, "Code rejected"))?;

    start_session(&session, &user).await?;
    let profile = load_profile(&state, user).await?;

    Ok(Json(SessionResponse { user: profile }))
}

/// Log out.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<Json<LogoutResponse>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(LogoutResponse { success: true }))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
    };
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&user.id, Some(user.username.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(())
}
