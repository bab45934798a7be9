// ============================
// crates/backend-lib/src/auth/service_impl.rs
// ============================
//! Default [`AuthService`]: orchestrates the credential store, password
//! hasher, token issuer and session store.
use super::{HashError, PasswordHashing, TokenIssuer};
use crate::auth::AuthService;
use crate::clock::Clock;
use crate::error::AppError;
use crate::metrics::{
    LOGIN_FAILED, LOGIN_SUCCEEDED, LOGOUT, REFRESH_REJECTED, REFRESH_ROTATED, USER_REGISTERED,
};
use crate::store::{CredentialStore, RefreshTokenRecord, SessionStore, StoreError};
use crate::validation::{
    validate_login_password, validate_new_password, validate_refresh_token, validate_username,
};
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use towernotes_common::TokenPair;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

pub struct DefaultAuth {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<dyn PasswordHashing>,
    issuer: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl DefaultAuth {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHashing>,
        issuer: TokenIssuer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            hasher,
            issuer,
            clock,
        }
    }

    /// Hashing is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);
        let plain = Zeroizing::new(password.to_string());
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| HashError::Aborted(e.to_string()))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let hasher = Arc::clone(&self.hasher);
        let plain = Zeroizing::new(password.to_string());
        let hash = hash.to_string();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .map_err(|e| HashError::Aborted(e.to_string()))??;
        Ok(matched)
    }

    /// Issue a pair and persist its refresh half as a new session.
    async fn open_session(&self, user_id: Uuid, username: &str) -> Result<TokenPair, AppError> {
        let tokens = self.issuer.issue(user_id, username, self.clock.now())?;
        let record =
            RefreshTokenRecord::new(tokens.refresh_token.clone(), user_id, tokens.refresh_expires_at);
        self.sessions.insert(record).await?;
        Ok(tokens.pair())
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    #[instrument(skip_all)]
    async fn register(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        validate_username(username)?;
        validate_new_password(password)?;

        if self.credentials.find_by_username(username).await?.is_some() {
            return Err(AppError::DuplicateUsername);
        }

        let password_hash = self.hash_password(password).await?;

        let created = self
            .credentials
            .create(username, &password_hash, self.clock.now())
            .await;
        let user = match created {
            Ok(user) => user,
            // Lost a race with a concurrent registration of the same name
            Err(StoreError::Conflict) => return Err(AppError::DuplicateUsername),
            Err(err) => return Err(err.into()),
        };

        // The account exists from here on; if the session cannot be opened
        // the client recovers by logging in.
        let pair = self
            .open_session(user.id, &user.username)
            .await
            .inspect_err(|err| {
                warn!(user_id = %user.id, %err, "user created without an initial session");
            })?;

        counter!(USER_REGISTERED).increment(1);
        info!(user_id = %user.id, "user registered");
        Ok(pair)
    }

    #[instrument(skip_all)]
    async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        validate_username(username)?;
        validate_login_password(password)?;

        let Some(user) = self.credentials.find_by_username(username).await? else {
            counter!(LOGIN_FAILED).increment(1);
            return Err(AppError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password_hash).await? {
            counter!(LOGIN_FAILED).increment(1);
            warn!(user_id = %user.id, "login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let pair = self.open_session(user.id, &user.username).await?;

        counter!(LOGIN_SUCCEEDED).increment(1);
        info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        if validate_refresh_token(refresh_token).is_err() {
            counter!(REFRESH_REJECTED).increment(1);
            return Err(AppError::InvalidRefreshToken);
        }

        let Some(session) = self.sessions.find(refresh_token).await? else {
            counter!(REFRESH_REJECTED).increment(1);
            return Err(AppError::InvalidRefreshToken);
        };

        let now = self.clock.now();
        if session.expires_at <= now {
            counter!(REFRESH_REJECTED).increment(1);
            info!(user_id = %session.user_id, "expired refresh token presented");
            return Err(AppError::ExpiredRefreshToken);
        }

        let tokens = self.issuer.issue(session.user_id, &session.username, now)?;
        let replacement = RefreshTokenRecord::new(
            tokens.refresh_token.clone(),
            session.user_id,
            tokens.refresh_expires_at,
        );

        // A concurrent refresh of the same token may have consumed it since
        // the lookup; only one rotation can win.
        if !self.sessions.rotate(refresh_token, replacement).await? {
            counter!(REFRESH_REJECTED).increment(1);
            return Err(AppError::InvalidRefreshToken);
        }

        counter!(REFRESH_ROTATED).increment(1);
        info!(user_id = %session.user_id, "refresh token rotated");
        Ok(tokens.pair())
    }

    #[instrument(skip_all)]
    async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        if validate_refresh_token(refresh_token).is_err() {
            return Ok(());
        }

        let revoked = self.sessions.revoke(refresh_token).await?;
        counter!(LOGOUT).increment(1);
        info!(revoked, "logout");
        Ok(())
    }
}
