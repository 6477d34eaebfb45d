//! `CodeStore` for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gachadex_core::{OneTimeCode, OneTimeCodeId, UserId};

use super::{CodeStore, PgStore, RepositoryError};

#[async_trait]
impl CodeStore for PgStore {
    async fn replace_code(
        &self,
        user_id: UserId,
        code: &OneTimeCode,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        // Upsert on the pending-code index so concurrent issues for one user
        // serialize on that row instead of racing a delete against an insert.
        sqlx::query(
            r"
            INSERT INTO gachadex.two_factor_codes (user_id, code, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) WHERE NOT used
            DO UPDATE SET code = EXCLUDED.code,
                          created_at = EXCLUDED.created_at,
                          expires_at = EXCLUDED.expires_at
            ",
        )
        .bind(user_id)
        .bind(code.as_str())
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume_code(
        &self,
        user_id: UserId,
        code: &OneTimeCode,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let consumed: Option<OneTimeCodeId> = sqlx::query_scalar(
            r"
            UPDATE gachadex.two_factor_codes
            SET used = TRUE
            WHERE user_id = $1 AND code = $2 AND NOT used AND expires_at > $3
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(code.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(consumed.is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM gachadex.two_factor_codes WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
