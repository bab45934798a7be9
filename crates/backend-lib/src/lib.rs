// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core of the towernotes auth server: account registration, login,
//! refresh-token rotation, logout and the bearer-token gate.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod store;
pub mod sweeper;
pub mod validation;

use crate::auth::{AccessVerifier, AuthService, DefaultAuth, ScryptHasher, TokenIssuer};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::store::{FlatFileStore, SessionStore};
use std::sync::Arc;

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Stateless access-token check used by the gate
    pub verifier: Arc<AccessVerifier>,
    /// Session store, shared with the expiry sweep
    pub sessions: Arc<dyn SessionStore>,
    pub clock: Arc<dyn Clock>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Open the flat-file store under `settings.data_dir` and wire the
    /// service against the wall clock.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let store = FlatFileStore::open(&settings.data_dir)?;
        Self::from_store(store, Arc::new(SystemClock), settings)
    }

    /// Wire the service over an already-open store and an explicit clock.
    pub fn from_store(
        store: FlatFileStore,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> anyhow::Result<Self> {
        let key = settings.signing_key();
        let hasher = ScryptHasher::new(settings.auth.scrypt_log_n)?;
        let issuer = TokenIssuer::with_ttls(&key, settings.access_ttl(), settings.refresh_ttl());
        let sessions: Arc<dyn SessionStore> = Arc::new(store.clone());

        let auth = DefaultAuth::new(
            Arc::new(store),
            Arc::clone(&sessions),
            Arc::new(hasher),
            issuer,
            Arc::clone(&clock),
        );

        Ok(Self {
            auth: Arc::new(auth),
            verifier: Arc::new(AccessVerifier::new(&key, Arc::clone(&clock))),
            sessions,
            clock,
            settings: Arc::new(settings),
        })
    }
}
