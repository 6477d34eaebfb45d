//! Account route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Profile, User};
use crate::routes::ApiJson;
use crate::state::AppState;

/// Two-factor toggle request body.
#[derive(Debug, Deserialize)]
pub struct TwoFactorRequest {
    pub enabled: bool,
}

/// Two-factor toggle response body.
#[derive(Debug, Serialize)]
pub struct TwoFactorResponse {
    pub two_factor_enabled: bool,
}

/// Current user's profile, including the collection.
///
/// GET /api/account
///
/// # Errors
///
/// Returns 401 if not logged in or the account no longer exists.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Profile>> {
    let user = state.auth().get_user(current.id).await?;
    Ok(Json(load_profile(&state, user).await?))
}

/// Turn the emailed second factor on or off.
///
/// POST /api/account/two-factor
///
/// # Errors
///
/// Returns 401 if not logged in.
pub async fn set_two_factor(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(req): ApiJson<TwoFactorRequest>,
) -> Result<Json<TwoFactorResponse>> {
    let user = state.auth().set_two_factor(current.id, req.enabled).await?;
    Ok(Json(TwoFactorResponse {
        two_factor_enabled: user.two_factor_enabled,
    }))
}

/// Project a user into a profile with their collection attached.
pub(crate) async fn load_profile(state: &AppState, user: User) -> Result<Profile> {
    let collection = state.capture().collection(user.id).await?;
    Ok(Profile::new(user, collection))
}
