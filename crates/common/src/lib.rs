// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the towernotes client and server.
//! This module defines the auth request/response bodies and the client-side
//! credential file.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

pub mod credentials;

pub use credentials::{CredentialFile, CredentialFileError, StoredAuth, ACCESS_TOKEN_LIFETIME};

/// Body of `register` and `login` calls.
///
/// The plaintext password is wiped from memory when the request is dropped.
#[derive(Deserialize, Serialize, Clone)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl CredentialsRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Drop for CredentialsRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Body of `refresh` and `logout` calls
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access/refresh token pair returned by register, login and refresh.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived signed credential presented on protected calls
    pub access_token: String,
    /// Opaque single-use credential exchanged for a new pair
    pub refresh_token: String,
}

/// Plain acknowledgement body (logout)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Identity carried by an access token
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: String,
    pub username: String,
}

/// Error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Stable machine-readable code, e.g. `AUTH_001`
    pub code: String,
    pub message: String,
}
