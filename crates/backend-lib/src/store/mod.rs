// ============================
// crates/backend-lib/src/store/mod.rs
// ============================
//! Storage abstraction for user credentials and refresh-token sessions.
//!
//! Two logical tables sit behind these traits: users (unique username) and
//! refresh tokens (unique token string). Implementations must serialize
//! conflicting writes on the same key, so that the username check-then-insert
//! and the refresh delete-then-insert are each a single atomic step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

mod flat_file;

pub use flat_file::{FlatFileStore, STORE_FILE};

#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint violated (username or token already present)
    #[error("unique constraint violated")]
    Conflict,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A registered account
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// One outstanding refresh-token session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn new(token: String, user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            token,
            user_id,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A refresh-token record joined with its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub user_id: Uuid,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user with both timestamps set to `now`. Fails with
    /// [`StoreError::Conflict`] if the username is taken, including when a
    /// concurrent create won the race.
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), StoreError>;

    /// Exact-match lookup, joined with the owning user.
    async fn find(&self, token: &str) -> Result<Option<ActiveSession>, StoreError>;

    /// Delete `old_token` and insert `replacement` as one step. Returns
    /// `false` without inserting anything if `old_token` is already gone.
    async fn rotate(
        &self,
        old_token: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, StoreError>;

    /// Delete a token. Returns whether it existed.
    async fn revoke(&self, token: &str) -> Result<bool, StoreError>;

    /// Drop every record whose expiry is at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}
