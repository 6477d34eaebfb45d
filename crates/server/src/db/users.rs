//! `UserStore` for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gachadex_core::{Credits, Email, UserId, Username};

use super::{
    PgStore, RepositoryError, UserStore, credits_from_column, credits_to_column,
    map_unique_violation,
};
use crate::models::{NewUser, User, UserCredentials};

const USER_COLUMNS: &str =
    "id, email, username, credits, two_factor_enabled, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    username: String,
    credits: i32,
    two_factor_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            username,
            credits: credits_from_column(row.credits)?,
            two_factor_enabled: row.two_factor_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO gachadex.users (email, username, password_hash, credits, two_factor_enabled)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(new_user.email.as_str())
        .bind(new_user.username.as_str())
        .bind(&new_user.password_hash)
        .bind(credits_to_column(new_user.credits))
        .bind(new_user.two_factor_enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM gachadex.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let row: Option<CredentialsRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM gachadex.users WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(UserCredentials {
                user: r.user.try_into()?,
                password_hash: r.password_hash,
            })
        })
        .transpose()
    }

    async fn set_two_factor(&self, id: UserId, enabled: bool) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE gachadex.users
            SET two_factor_enabled = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(enabled)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn grant_credits(&self, id: UserId, amount: u32) -> Result<Credits, RepositoryError> {
        let credits: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE gachadex.users
            SET credits = LEAST(credits::BIGINT + $2, $3)::INTEGER,
                updated_at = now()
            WHERE id = $1
            RETURNING credits
            ",
        )
        .bind(id)
        .bind(i64::from(amount))
        .bind(i64::from(Credits::MAX.get()))
        .fetch_optional(&self.pool)
        .await?;

        credits_from_column(credits.ok_or(RepositoryError::NotFound)?)
    }
}
