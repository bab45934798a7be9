//! Local login state.
//!
//! Every successful register or login overwrites the credential file with the
//! new pair. Logout asks the server to revoke the stored refresh token but
//! forgets the local pair whatever the server says.
use crate::api::{AuthApi, ClientError};
use chrono::Utc;
use towernotes_common::{CredentialFile, StoredAuth};
use tracing::{debug, warn};

pub struct CliAuth<A> {
    api: A,
    file: CredentialFile,
}

impl<A: AuthApi> CliAuth<A> {
    pub fn new(api: A, file: CredentialFile) -> Self {
        Self { api, file }
    }

    pub fn credential_file(&self) -> &CredentialFile {
        &self.file
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<StoredAuth, ClientError> {
        let pair = self.api.register(username, password).await?;
        Ok(self.file.store(&pair, username, Utc::now())?)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<StoredAuth, ClientError> {
        let pair = self.api.login(username, password).await?;
        Ok(self.file.store(&pair, username, Utc::now())?)
    }

    /// Returns the user that was logged out, or `None` if nobody was.
    pub async fn logout(&self) -> Result<Option<String>, ClientError> {
        let Some(stored) = self.file.load() else {
            // drop any unreadable leftover
            self.file.clear()?;
            return Ok(None);
        };

        match self.api.logout(&stored.refresh_token).await {
            Ok(()) => debug!(username = %stored.username, "refresh token revoked"),
            Err(err) => warn!(%err, "server-side logout failed; clearing local credentials anyway"),
        }

        self.file.clear()?;
        Ok(Some(stored.username))
    }

    /// Stored pair, if any, and whether its access token is still fresh.
    pub fn status(&self) -> Option<(StoredAuth, bool)> {
        let stored = self.file.load()?;
        let fresh = stored.expires_at > Utc::now();
        Some((stored, fresh))
    }
}
