//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gachadex_core::{Credits, Email, UserId, Username};

use super::collection::CollectedItem;

/// A registered trainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address, where one-time codes are sent.
    pub email: Email,
    /// Unique login name.
    pub username: Username,
    /// Pokéball balance.
    pub credits: Credits,
    /// Whether login requires an emailed one-time code.
    pub two_factor_enabled: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A user row together with its password hash, for login only.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    /// PHC-format Argon2 hash.
    pub password_hash: String,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub username: Username,
    pub password_hash: String,
    pub credits: Credits,
    pub two_factor_enabled: bool,
}

/// Public projection of a user, returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub username: Username,
    pub credits: Credits,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub collection: Vec<CollectedItem>,
}

impl Profile {
    #[must_use]
    pub fn new(user: User, collection: Vec<CollectedItem>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            credits: user.credits,
            two_factor_enabled: user.two_factor_enabled,
            created_at: user.created_at,
            collection,
        }
    }
}
