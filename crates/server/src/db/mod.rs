//! Persistence for accounts, collections, and one-time codes.
//!
//! # Schema: `gachadex`
//!
//! ## Tables
//!
//! - `users` - Accounts, password hashes, and pokéball balances
//! - `user_collection` - One row per owned catalog item, unique per user
//! - `two_factor_codes` - Issued one-time codes; at most one unused per user
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Stores
//!
//! Services talk to storage through the [`UserStore`], [`CollectionStore`],
//! and [`CodeStore`] traits. [`PgStore`] is the production implementation and
//! [`MemoryStore`] backs tests and local experiments.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p gachadex-cli -- migrate
//! ```

mod codes;
mod collection;
pub mod memory;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use gachadex_core::{CatalogItemId, Credits, MergeOutcome, OneTimeCode, UserId, Username};

use crate::models::{CollectionEntry, NewUser, User, UserCredentials};

pub use memory::MemoryStore;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store traits
// =============================================================================

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict("email")` or `Conflict("username")`
    /// when the value is already taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<UserCredentials>, RepositoryError>;

    /// Returns `RepositoryError::NotFound` for an unknown user.
    async fn set_two_factor(&self, id: UserId, enabled: bool) -> Result<User, RepositoryError>;

    /// Add to a balance, saturating at [`Credits::MAX`]. Returns the new total.
    async fn grant_credits(&self, id: UserId, amount: u32) -> Result<Credits, RepositoryError>;
}

/// A capture to commit: the drawn item and what it costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub item_id: CatalogItemId,
    pub shiny: bool,
    pub cost: u32,
}

/// Result of [`CollectionStore::commit_capture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommit {
    /// Merge applied and balance decremented.
    Committed {
        outcome: MergeOutcome,
        remaining: Credits,
    },
    /// The balance no longer covered the cost. Nothing was written.
    InsufficientCredits { balance: Credits },
}

/// Collection and balance storage.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Returns `RepositoryError::NotFound` for an unknown user.
    async fn credits(&self, user_id: UserId) -> Result<Credits, RepositoryError>;

    /// Apply the merge rule for `capture` and spend its cost as one unit.
    async fn commit_capture(
        &self,
        user_id: UserId,
        capture: Capture,
    ) -> Result<CaptureCommit, RepositoryError>;

    /// Owned entries, newest first.
    async fn entries(&self, user_id: UserId) -> Result<Vec<CollectionEntry>, RepositoryError>;
}

/// One-time code storage.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Make `code` the user's only unused code, replacing any pending one.
    ///
    /// Concurrent calls for the same user must leave exactly one unused code.
    async fn replace_code(
        &self,
        user_id: UserId,
        code: &OneTimeCode,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Mark a matching, unused, unexpired code as used.
    ///
    /// Returns `true` only for the single caller that flipped the flag.
    async fn consume_code(
        &self,
        user_id: UserId,
        code: &OneTimeCode,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Delete every code with `expires_at <= now`. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// `PostgreSQL` implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a unique violation to `Conflict`, naming the column from the constraint.
fn map_unique_violation(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let column = match db_err.constraint() {
            Some(c) if c.contains("username") => "username",
            Some(c) if c.contains("email") => "email",
            _ => "unique",
        };
        return RepositoryError::Conflict(column.to_owned());
    }
    RepositoryError::Database(err)
}

/// Convert a stored integer balance.
fn credits_from_column(value: i32) -> Result<Credits, RepositoryError> {
    Credits::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative credits in database: {value}")))
}

/// Convert a balance for binding.
fn credits_to_column(credits: Credits) -> i32 {
    i32::from(credits)
}
