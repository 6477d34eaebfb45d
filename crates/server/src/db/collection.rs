//! `CollectionStore` for `PostgreSQL`.
//!
//! A capture runs in one transaction: the user row is locked, the owned
//! entry (if any) is locked, the merge outcome is applied, and the balance is
//! decremented with `credits >= cost` in the predicate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gachadex_core::{CatalogItemId, Credits, MergeOutcome, UserId};

use super::{
    Capture, CaptureCommit, CollectionStore, PgStore, RepositoryError, credits_from_column,
};
use crate::models::CollectionEntry;

#[derive(sqlx::FromRow)]
struct EntryRow {
    item_id: CatalogItemId,
    shiny: bool,
    caught_at: DateTime<Utc>,
}

#[async_trait]
impl CollectionStore for PgStore {
    async fn credits(&self, user_id: UserId) -> Result<Credits, RepositoryError> {
        let credits: Option<i32> =
            sqlx::query_scalar("SELECT credits FROM gachadex.users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        credits_from_column(credits.ok_or(RepositoryError::NotFound)?)
    }

    async fn commit_capture(
        &self,
        user_id: UserId,
        capture: Capture,
    ) -> Result<CaptureCommit, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let balance: Option<i32> =
            sqlx::query_scalar("SELECT credits FROM gachadex.users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let balance = credits_from_column(balance.ok_or(RepositoryError::NotFound)?)?;

        if !balance.covers(capture.cost) {
            tx.rollback().await?;
            return Ok(CaptureCommit::InsufficientCredits { balance });
        }

        let existing: Option<bool> = sqlx::query_scalar(
            r"
            SELECT shiny FROM gachadex.user_collection
            WHERE user_id = $1 AND item_id = $2
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .bind(capture.item_id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = MergeOutcome::decide(existing, capture.shiny);
        match outcome {
            MergeOutcome::Added => {
                sqlx::query(
                    r"
                    INSERT INTO gachadex.user_collection (user_id, item_id, shiny)
                    VALUES ($1, $2, $3)
                    ",
                )
                .bind(user_id)
                .bind(capture.item_id)
                .bind(capture.shiny)
                .execute(&mut *tx)
                .await?;
            }
            MergeOutcome::Upgraded => {
                sqlx::query(
                    r"
                    UPDATE gachadex.user_collection
                    SET shiny = TRUE
                    WHERE user_id = $1 AND item_id = $2
                    ",
                )
                .bind(user_id)
                .bind(capture.item_id)
                .execute(&mut *tx)
                .await?;
            }
            MergeOutcome::Unchanged => {}
        }

        let remaining: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE gachadex.users
            SET credits = credits - $2, updated_at = now()
            WHERE id = $1 AND credits >= $2
            RETURNING credits
            ",
        )
        .bind(user_id)
        .bind(i64::from(capture.cost))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(remaining) = remaining else {
            // The row lock makes this unreachable unless the cost overflows the column.
            tx.rollback().await?;
            return Ok(CaptureCommit::InsufficientCredits { balance });
        };

        tx.commit().await?;

        Ok(CaptureCommit::Committed {
            outcome,
            remaining: credits_from_column(remaining)?,
        })
    }

    async fn entries(&self, user_id: UserId) -> Result<Vec<CollectionEntry>, RepositoryError> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            r"
            SELECT item_id, shiny, caught_at
            FROM gachadex.user_collection
            WHERE user_id = $1
            ORDER BY caught_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CollectionEntry {
                item_id: r.item_id,
                shiny: r.shiny,
                caught_at: r.caught_at,
            })
            .collect())
    }
}
