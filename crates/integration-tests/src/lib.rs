//! Scenario tests for Gachadex.
//!
//! The services run against in-memory collaborators: [`MemoryStore`] for
//! storage, [`ManualClock`] for time, and [`RecordingMailer`] in place of
//! SMTP. No database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gachadex-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use gachadex_core::{Catalog, Email, OneTimeCode};
use gachadex_server::db::MemoryStore;
use gachadex_server::services::auth::AuthService;
use gachadex_server::services::capture::CaptureService;
use gachadex_server::services::email::{EmailError, EmailSender};
use gachadex_server::services::two_factor::{ManualClock, TwoFactorService};

/// Pokéballs a new account starts with.
pub const STARTING_CREDITS: u32 = 5;

/// Cost of one draw.
pub const DRAW_COST: u32 = 1;

/// A delivered message.
#[derive(Debug, Clone)]
pub struct SentCode {
    pub to: Email,
    pub code: OneTimeCode,
}

/// Email sender that keeps every message in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentCode>>>,
    fail: bool,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Everything delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentCode> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent code delivered to `to`.
    #[must_use]
    pub fn last_code_for(&self, to: &str) -> Option<OneTimeCode> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to.as_str() == to)
            .map(|m| m.code)
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send_code(&self, to: &Email, code: &OneTimeCode) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::InvalidAddress(format!("mailbox {to} unavailable")));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentCode {
                to: to.clone(),
                code: code.clone(),
            });
        Ok(())
    }
}

/// Everything a scenario needs, wired together.
pub struct TestContext {
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub mailer: RecordingMailer,
    pub catalog: Catalog,
}

impl TestContext {
    /// A context with the given catalog JSON and a working mailer.
    ///
    /// # Panics
    ///
    /// Panics if the catalog JSON is invalid.
    #[must_use]
    pub fn with_catalog(json: &str) -> Self {
        Self::build(json, RecordingMailer::new())
    }

    /// A context whose mailer fails every delivery.
    ///
    /// # Panics
    ///
    /// Panics if the catalog JSON is invalid.
    #[must_use]
    pub fn with_failing_mailer(json: &str) -> Self {
        Self::build(json, RecordingMailer::failing())
    }

    #[allow(clippy::expect_used)]
    fn build(json: &str, mailer: RecordingMailer) -> Self {
        Self {
            store: MemoryStore::new(),
            clock: ManualClock::new(epoch()),
            mailer,
            catalog: Catalog::from_json(json).expect("test catalog is valid"),
        }
    }

    #[must_use]
    pub const fn auth(&self) -> AuthService<'_, MemoryStore, ManualClock, RecordingMailer> {
        AuthService::new(&self.store, &self.clock, &self.mailer, STARTING_CREDITS)
    }

    #[must_use]
    pub const fn capture(&self) -> CaptureService<'_, MemoryStore> {
        CaptureService::new(&self.store, &self.catalog, DRAW_COST)
    }

    #[must_use]
    pub const fn codes(&self) -> TwoFactorService<'_, MemoryStore, ManualClock> {
        TwoFactorService::new(&self.store, &self.clock)
    }
}

/// Fixed start time for every scenario.
///
/// # Panics
///
/// Never; the date is valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

/// One Common item only.
pub const SINGLE_COMMON_CATALOG: &str =
    r#"[{"id": 1, "name": "Pidgey", "type": "Normal", "rarity": "Common", "image": "./Front/016.png"}]"#;

/// The catalog the server ships with.
pub const SHIPPED_CATALOG: &str = include_str!("../../server/data/catalog.json");
