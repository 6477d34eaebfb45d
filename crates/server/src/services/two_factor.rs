//! One-time code authenticator.
//!
//! Per user there is either no pending code or exactly one. Issuing a code
//! replaces any pending one; a successful verify consumes it. Wrong or
//! expired attempts leave the pending code in place until it expires.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::instrument;

use gachadex_core::{CODE_TTL_SECONDS, OneTimeCode, UserId};

use crate::db::{CodeStore, RepositoryError};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Issues, verifies, and sweeps one-time codes.
pub struct TwoFactorService<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

impl<'a, S: CodeStore, C: Clock> TwoFactorService<'a, S, C> {
    #[must_use]
    pub const fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Store `code` as the user's only pending code, valid for five minutes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails. The caller must not send
    /// the code in that case.
    pub async fn issue(&self, user_id: UserId, code: &OneTimeCode) -> Result<(), RepositoryError> {
        let now = self.clock.now();
        let expires_at = now + TimeDelta::seconds(CODE_TTL_SECONDS);
        self.store
            .replace_code(user_id, code, now, expires_at)
            .await?;
        tracing::debug!(user_id = %user_id, %expires_at, "Issued one-time code");
        Ok(())
    }

    /// Generate a fresh code and issue it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn issue_new(&self, user_id: UserId) -> Result<OneTimeCode, RepositoryError> {
        let code = {
            let mut rng = rand::rng();
            OneTimeCode::generate(&mut rng)
        };
        self.issue(user_id, &code).await?;
        Ok(code)
    }

    /// Consume the user's pending code if `code` matches and has not expired.
    ///
    /// A wrong value, an expired code, a used code, and no code at all all
    /// return `false`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn verify(&self, user_id: UserId, code: &OneTimeCode) -> Result<bool, RepositoryError> {
        let verified = self
            .store
            .consume_code(user_id, code, self.clock.now())
            .await?;
        if !verified {
            tracing::info!(user_id = %user_id, "One-time code rejected");
        }
        Ok(verified)
    }

    /// Delete every code that has expired. Safe to run repeatedly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn cleanup_expired(&self) -> Result<u64, RepositoryError> {
        self.store.delete_expired(self.clock.now()).await
    }
}

/// Sweep expired codes every `period` until the process exits.
#[instrument(skip_all, fields(period_secs = period.as_secs()))]
pub async fn run_cleanup_task<S: CodeStore, C: Clock>(store: S, clock: C, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match TwoFactorService::new(&store, &clock).cleanup_expired().await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "Removed expired one-time codes"),
            Err(e) => tracing::error!(error = %e, "Failed to remove expired one-time codes"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::db::MemoryStore;

    fn start() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
    }

    fn code(s: &str) -> OneTimeCode {
        OneTimeCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_verify_before_expiry_then_single_use() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);
        let user = UserId::new(1);

        service.issue(user, &code("123456")).await.unwrap();
        clock.advance(TimeDelta::seconds(4 * 60 + 59));

        assert!(service.verify(user, &code("123456")).await.unwrap());
        assert!(!service.verify(user, &code("123456")).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_after_expiry_fails() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);
        let user = UserId::new(1);

        service.issue(user, &code("123456")).await.unwrap();
        clock.advance(TimeDelta::seconds(5 * 60 + 1));

        assert!(!service.verify(user, &code("123456")).await.unwrap());
    }

    #[tokio::test]
    async fn test_expiry_boundary_is_exclusive() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);
        let user = UserId::new(1);

        service.issue(user, &code("654321")).await.unwrap();
        clock.advance(TimeDelta::seconds(CODE_TTL_SECONDS));

        assert!(!service.verify(user, &code("654321")).await.unwrap());
    }

    #[tokio::test]
    async fn test_reissue_supersedes_previous_code() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);
        let user = UserId::new(1);

        service.issue(user, &code("111111")).await.unwrap();
        service.issue(user, &code("222222")).await.unwrap();

        assert!(!service.verify(user, &code("111111")).await.unwrap());
        assert!(service.verify(user, &code("222222")).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_issues_leave_one_pending_code() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);
        let user = UserId::new(1);

        let (a, b) = (code("111111"), code("222222"));
        let (first, second) = tokio::join!(service.issue(user, &a), service.issue(user, &b));
        first.unwrap();
        second.unwrap();

        assert_eq!(store.unused_code_count(user), 1);
        let accepted = [
            service.verify(user, &code("111111")).await.unwrap(),
            service.verify(user, &code("222222")).await.unwrap(),
        ];
        assert_eq!(accepted.iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_pending_code() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);
        let user = UserId::new(1);

        service.issue(user, &code("111111")).await.unwrap();
        assert!(!service.verify(user, &code("999999")).await.unwrap());
        assert!(service.verify(user, &code("111111")).await.unwrap());
    }

    #[tokio::test]
    async fn test_codes_are_scoped_to_user() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);

        service.issue(UserId::new(1), &code("111111")).await.unwrap();
        assert!(!service.verify(UserId::new(2), &code("111111")).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);

        service.issue(UserId::new(1), &code("111111")).await.unwrap();
        clock.advance(TimeDelta::minutes(3));
        service.issue(UserId::new(2), &code("222222")).await.unwrap();
        clock.advance(TimeDelta::minutes(2));

        assert_eq!(service.cleanup_expired().await.unwrap(), 1);
        assert_eq!(service.cleanup_expired().await.unwrap(), 0);
        assert!(service.verify(UserId::new(2), &code("222222")).await.unwrap());
    }

    #[tokio::test]
    async fn test_issue_new_generates_six_digits() {
        let store = MemoryStore::new();
        let clock = start();
        let service = TwoFactorService::new(&store, &clock);

        let issued = service.issue_new(UserId::new(1)).await.unwrap();
        assert_eq!(issued.as_str().len(), 6);
        assert!(service.verify(UserId::new(1), &issued).await.unwrap());
    }
}
