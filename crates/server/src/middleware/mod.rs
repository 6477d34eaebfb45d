//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span and Sentry scope)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting on `/api` (governor), with 429s rewritten to JSON

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::{
    ClientIpKeyExtractor, api_rate_limiter, auth_rate_limiter, rate_limit_json,
};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
