// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait: the register / login /
//! refresh / logout operations exposed to the transport layer.
use crate::error::AppError;
use async_trait::async_trait;
use towernotes_common::TokenPair;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and open its first session.
    async fn register(&self, username: &str, password: &str) -> Result<TokenPair, AppError>;

    /// Open a new session for an existing account.
    async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError>;

    /// Exchange a refresh token for a new pair. The presented token is
    /// consumed whether or not the caller receives the response.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError>;

    /// Revoke a refresh token. Unknown tokens are not an error.
    async fn logout(&self, refresh_token: &str) -> Result<(), AppError>;
}
