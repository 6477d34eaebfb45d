//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database)
//!
//! # Auth (strict rate limit)
//! POST /api/auth/register          - Create account, email first code
//! POST /api/auth/login             - Password check, may require a code
//! POST /api/auth/verify-2fa        - Finish login with the emailed code
//! POST /api/auth/logout            - Clear the session
//!
//! # Account (requires auth)
//! GET  /api/account                - Profile with collection
//! POST /api/account/two-factor     - Toggle the emailed second factor
//!
//! # Pokémon
//! GET  /api/catalog                - Catalog items
//! GET  /api/pokemon/collection     - Owned items, newest first (requires auth)
//! POST /api/pokemon/draw           - Server-side draw (requires auth)
//! POST /api/pokemon/catch          - Commit a client-side draw (requires auth)
//! POST /api/pokemon/collect-ball   - Grant one pokéball (requires auth)
//! ```

pub mod account;
pub mod auth;
pub mod pokemon;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    middleware::map_response,
    routing::{get, post},
};

use crate::error::AppError;
use crate::middleware::{
    ClientIpKeyExtractor, api_rate_limiter, auth_rate_limiter, rate_limit_json,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-2fa", post(auth::verify_two_factor))
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile))
        .route("/two-factor", post(account::set_two_factor))
}

/// Create the Pokémon routes router.
pub fn pokemon_routes() -> Router<AppState> {
    Router::new()
        .route("/collection", get(pokemon::collection))
        .route("/draw", post(pokemon::draw))
        .route("/catch", post(pokemon::catch))
        .route("/collect-ball", post(pokemon::collect_ball))
}

/// Build the `/api` router with rate limits applied.
///
/// Limits key on the socket peer unless `trust_proxy_headers` is set.
pub fn api_routes(trust_proxy_headers: bool) -> Router<AppState> {
    let key_extractor = ClientIpKeyExtractor::new(trust_proxy_headers);
    let auth = auth_routes().layer(auth_rate_limiter(key_extractor));

    let rest = Router::new()
        .route("/catalog", get(pokemon::catalog))
        .nest("/account", account_routes())
        .nest("/pokemon", pokemon_routes())
        .layer(api_rate_limiter(key_extractor));

    Router::new()
        .nest("/auth", auth)
        .merge(rest)
        .layer(map_response(rate_limit_json))
}

/// JSON body extractor whose rejections use the API error format.
///
/// Malformed or mistyped bodies become a 400 with `reason: "validation"`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
