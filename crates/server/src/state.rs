//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use gachadex_core::Catalog;

use crate::config::ServerConfig;
use crate::db::PgStore;
use crate::services::auth::AuthService;
use crate::services::capture::CaptureService;
use crate::services::email::Mailer;
use crate::services::two_factor::SystemClock;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store, catalog, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: PgStore,
    catalog: Catalog,
    mailer: Mailer,
    clock: SystemClock,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool, catalog: Catalog, mailer: Mailer) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store: PgStore::new(pool),
                catalog,
                mailer,
                clock: SystemClock,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.inner.store.pool()
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &PgStore {
        &self.inner.store
    }

    /// Get a reference to the loaded catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_, PgStore, SystemClock, Mailer> {
        AuthService::new(
            &self.inner.store,
            &self.inner.clock,
            &self.inner.mailer,
            self.inner.config.game.starting_credits,
        )
    }

    /// Capture service bound to this state.
    #[must_use]
    pub fn capture(&self) -> CaptureService<'_, PgStore> {
        CaptureService::new(
            &self.inner.store,
            &self.inner.catalog,
            self.inner.config.game.draw_cost,
        )
    }
}
