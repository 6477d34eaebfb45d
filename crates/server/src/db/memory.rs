//! In-process store behind a mutex.
//!
//! Implements the same contracts as [`PgStore`](super::PgStore), including
//! the at-most-one-unused-code rule and atomic captures, so services can be
//! exercised without a database.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gachadex_core::{Credits, MergeOutcome, OneTimeCode, UserId, Username};

use super::{Capture, CaptureCommit, CodeStore, CollectionStore, RepositoryError, UserStore};
use crate::models::{CollectionEntry, NewUser, User, UserCredentials};

#[derive(Debug, Clone)]
struct StoredCode {
    user_id: UserId,
    code: OneTimeCode,
    expires_at: DateTime<Utc>,
    used: bool,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, UserCredentials>,
    collections: BTreeMap<UserId, Vec<CollectionEntry>>,
    codes: Vec<StoredCode>,
    next_user_id: i32,
}

/// Shared in-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of unused codes held for a user, expired or not.
    #[must_use]
    pub fn unused_code_count(&self, user_id: UserId) -> usize {
        self.lock()
            .codes
            .iter()
            .filter(|c| c.user_id == user_id && !c.used)
            .count()
    }

    /// Total stored codes, used or not.
    #[must_use]
    pub fn code_count(&self) -> usize {
        self.lock().codes.len()
    }

    /// Overwrite a balance directly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown user.
    pub fn set_credits(&self, user_id: UserId, credits: Credits) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let record = state
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        record.user.credits = credits;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.lock();

        for existing in state.users.values() {
            if existing.user.email == new_user.email {
                return Err(RepositoryError::Conflict("email".to_owned()));
            }
            if existing.user.username == new_user.username {
                return Err(RepositoryError::Conflict("username".to_owned()));
            }
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(state.next_user_id),
            email: new_user.email,
            username: new_user.username,
            credits: new_user.credits,
            two_factor_enabled: new_user.two_factor_enabled,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.get(&id).map(|r| r.user.clone()))
    }

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|r| &r.user.username == username)
            .cloned())
    }

    async fn set_two_factor(&self, id: UserId, enabled: bool) -> Result<User, RepositoryError> {
        let mut state = self.lock();
        let record = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        record.user.two_factor_enabled = enabled;
        record.user.updated_at = Utc::now();
        Ok(record.user.clone())
    }

    async fn grant_credits(&self, id: UserId, amount: u32) -> Result<Credits, RepositoryError> {
        let mut state = self.lock();
        let record = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        record.user.credits = record.user.credits.grant(amount);
        record.user.updated_at = Utc::now();
        Ok(record.user.credits)
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn credits(&self, user_id: UserId) -> Result<Credits, RepositoryError> {
        self.lock()
            .users
            .get(&user_id)
            .map(|r| r.user.credits)
            .ok_or(RepositoryError::NotFound)
    }

    async fn commit_capture(
        &self,
        user_id: UserId,
        capture: Capture,
    ) -> Result<CaptureCommit, RepositoryError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let balance = state
            .users
            .get(&user_id)
            .map(|r| r.user.credits)
            .ok_or(RepositoryError::NotFound)?;

        let Ok(remaining) = balance.spend(capture.cost) else {
            return Ok(CaptureCommit::InsufficientCredits { balance });
        };

        let entries = state.collections.entry(user_id).or_default();
        let existing = entries.iter_mut().find(|e| e.item_id == capture.item_id);
        let outcome = MergeOutcome::decide(existing.as_ref().map(|e| e.shiny), capture.shiny);
        match existing {
            Some(entry) => {
                if outcome == MergeOutcome::Upgraded {
                    entry.shiny = true;
                }
            }
            None => entries.push(CollectionEntry {
                item_id: capture.item_id,
                shiny: capture.shiny,
                caught_at: Utc::now(),
            }),
        }

        if let Some(record) = state.users.get_mut(&user_id) {
            record.user.credits = remaining;
            record.user.updated_at = Utc::now();
        }

        Ok(CaptureCommit::Committed { outcome, remaining })
    }

    async fn entries(&self, user_id: UserId) -> Result<Vec<CollectionEntry>, RepositoryError> {
        let state = self.lock();
        let mut entries = state.collections.get(&user_id).cloned().unwrap_or_default();
        // Insertion order is oldest first; reverse before the stable sort so
        // ties on caught_at keep newest first.
        entries.reverse();
        entries.sort_by(|a, b| b.caught_at.cmp(&a.caught_at));
        Ok(entries)
    }
}

#[async_trait]
impl CodeStore for MemoryStore {
    async fn replace_code(
        &self,
        user_id: UserId,
        code: &OneTimeCode,
        _created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state.codes.retain(|c| c.user_id != user_id || c.used);
        state.codes.push(StoredCode {
            user_id,
            code: code.clone(),
            expires_at,
            used: false,
        });
        Ok(())
    }

    async fn consume_code(
        &self,
        user_id: UserId,
        code: &OneTimeCode,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        let found = state.codes.iter_mut().find(|c| {
            c.user_id == user_id && &c.code == code && !c.used && c.expires_at > now
        });
        Ok(found.map(|c| c.used = true).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut state = self.lock();
        let before = state.codes.len();
        state.codes.retain(|c| c.expires_at > now);
        Ok(u64::try_from(before - state.codes.len()).unwrap_or(u64::MAX))
    }
}
