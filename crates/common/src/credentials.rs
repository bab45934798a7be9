//! Client-side credential file.
//!
//! The CLI keeps the last issued token pair in `~/.tower/.auth/tokens.json`
//! so later invocations can call protected endpoints. The file holds live
//! bearer credentials and is created owner read/write only.

use crate::TokenPair;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Local estimate of how long a freshly stored access token stays usable.
pub const ACCESS_TOKEN_LIFETIME: Duration = Duration::minutes(15);

const AUTH_DIR: &str = ".tower/.auth";
const AUTH_FILE: &str = "tokens.json";

#[derive(Debug, Error)]
pub enum CredentialFileError {
    #[error("home directory could not be determined")]
    NoHomeDir,

    #[error("credential file IO error: {0}")]
    Io(#[from] io::Error),

    #[error("credential file encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Contents of the credential file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredAuth {
    pub access_token: String,
    pub refresh_token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Handle on the credential file at a fixed path
#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `~/.tower/.auth/tokens.json`
    pub fn default_location() -> Result<Self, CredentialFileError> {
        let base = directories::BaseDirs::new().ok_or(CredentialFileError::NoHomeDir)?;
        Ok(Self::new(base.home_dir().join(AUTH_DIR).join(AUTH_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record. A missing or unreadable file counts as logged out.
    pub fn load(&self) -> Option<StoredAuth> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(auth) => Some(auth),
            Err(err) => {
                tracing::debug!(path = %self.path.display(), %err, "ignoring corrupt credential file");
                None
            },
        }
    }

    /// Persist a freshly issued pair for `username`.
    pub fn store(
        &self,
        tokens: &TokenPair,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<StoredAuth, CredentialFileError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let auth = StoredAuth {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            username: username.to_string(),
            expires_at: now + ACCESS_TOKEN_LIFETIME,
        };
        let json = serde_json::to_string_pretty(&auth)?;

        let mut file = open_owner_only(&self.path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        restrict_permissions(&self.path)?;

        Ok(auth)
    }

    /// Remove the file. Already-absent is fine.
    pub fn clear(&self) -> Result<(), CredentialFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn is_logged_in(&self, now: DateTime<Utc>) -> bool {
        self.load().is_some_and(|auth| auth.expires_at > now)
    }

    pub fn current_user(&self) -> Option<String> {
        self.load().map(|auth| auth.username)
    }
}

#[cfg(unix)]
fn open_owner_only(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// `mode` only applies on creation; an existing file keeps its old bits.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
