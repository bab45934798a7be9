// ============================
// crates/backend-lib/src/store/flat_file.rs
// ============================
//! Flat-file store.
//!
//! Both tables live in memory behind one `RwLock` and are snapshotted to a
//! single JSON file after every mutation. A mutation works on a copy of the
//! tables, writes the copy to disk, and only then replaces the in-memory
//! tables, so memory never runs ahead of the snapshot. The whole commit runs
//! in its own task holding the write guard; dropping the caller cannot stop
//! it halfway.
use super::{
    ActiveSession, CredentialStore, RefreshTokenRecord, SessionStore, StoreError, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs as tokio_fs,
    sync::{OwnedRwLockWriteGuard, RwLock},
};
use uuid::Uuid;

/// Snapshot file name inside the data directory
pub const STORE_FILE: &str = "auth-store.json";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Tables {
    /// username -> user
    users: HashMap<String, User>,
    /// token -> record
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
    #[serde(skip)]
    usernames_by_id: HashMap<Uuid, String>,
}

impl Tables {
    fn reindex(&mut self) {
        self.usernames_by_id = self
            .users
            .values()
            .map(|user| (user.id, user.username.clone()))
            .collect();
    }
}

/// Outcome of a mutation closure
enum Mutation<T> {
    /// Persist the edited copy, then return `T`
    Commit(T),
    /// Nothing changed; drop the copy and return `T`
    Skip(T),
}

/// JSON snapshot-backed implementation of both store traits
#[derive(Clone)]
pub struct FlatFileStore {
    tables: Arc<RwLock<Tables>>,
    /// `None` keeps everything in memory
    path: Option<Arc<PathBuf>>,
}

impl FlatFileStore {
    /// Open (or create) the store under `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let path = data_dir.join(STORE_FILE);
        let mut tables = if path.exists() {
            let content = fs::read(&path)?;
            serde_json::from_slice::<Tables>(&content)?
        } else {
            Tables::default()
        };
        tables.reindex();

        tracing::info!(
            path = %path.display(),
            users = tables.users.len(),
            sessions = tables.refresh_tokens.len(),
            "opened auth store"
        );

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            path: Some(Arc::new(path)),
        })
    }

    /// Store with no backing file
    pub fn in_memory() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            path: None,
        }
    }

    /// Number of refresh-token records currently held
    pub async fn session_count(&self) -> usize {
        self.tables.read().await.refresh_tokens.len()
    }

    /// Apply `edit` to a copy of the tables under the write lock, snapshot the
    /// copy and swap it in. An error from `edit` or from the snapshot leaves
    /// the live tables untouched.
    async fn mutate<T, F>(&self, edit: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Tables) -> Result<Mutation<T>, StoreError> + Send + 'static,
    {
        let live = Arc::clone(&self.tables).write_owned().await;
        tokio::spawn(commit(live, self.path.clone(), edit)).await?
    }
}

async fn commit<T, F>(
    mut live: OwnedRwLockWriteGuard<Tables>,
    path: Option<Arc<PathBuf>>,
    edit: F,
) -> Result<T, StoreError>
where
    F: FnOnce(&mut Tables) -> Result<Mutation<T>, StoreError>,
{
    let mut next = (*live).clone();
    match edit(&mut next)? {
        Mutation::Skip(out) => Ok(out),
        Mutation::Commit(out) => {
            if let Some(path) = path {
                persist(&path, &next).await?;
            }
            *live = next;
            Ok(out)
        },
    }
}

async fn persist(path: &Path, tables: &Tables) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(tables)?;
    let tmp = path.with_extension("json.tmp");
    tokio_fs::write(&tmp, &json).await?;
    restrict_permissions(&tmp).await?;
    tokio_fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio_fs::set_permissions(path, fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl CredentialStore for FlatFileStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(username).cloned())
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.mutate(move |tables| {
            if tables.users.contains_key(&user.username) {
                return Err(StoreError::Conflict);
            }
            tables.usernames_by_id.insert(user.id, user.username.clone());
            tables.users.insert(user.username.clone(), user.clone());
            Ok(Mutation::Commit(user))
        })
        .await
    }
}

#[async_trait]
impl SessionStore for FlatFileStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), StoreError> {
        self.mutate(move |tables| {
            if tables.refresh_tokens.contains_key(&record.token) {
                return Err(StoreError::Conflict);
            }
            tables.refresh_tokens.insert(record.token.clone(), record);
            Ok(Mutation::Commit(()))
        })
        .await
    }

    async fn find(&self, token: &str) -> Result<Option<ActiveSession>, StoreError> {
        let tables = self.tables.read().await;
        let Some(record) = tables.refresh_tokens.get(token) else {
            return Ok(None);
        };
        // A record whose owner vanished is unusable
        let Some(username) = tables.usernames_by_id.get(&record.user_id) else {
            return Ok(None);
        };

        Ok(Some(ActiveSession {
            user_id: record.user_id,
            username: username.clone(),
            expires_at: record.expires_at,
        }))
    }

    async fn rotate(
        &self,
        old_token: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, StoreError> {
        let old_token = old_token.to_string();
        self.mutate(move |tables| {
            if tables.refresh_tokens.contains_key(&replacement.token) {
                return Err(StoreError::Conflict);
            }
            if tables.refresh_tokens.remove(&old_token).is_none() {
                return Ok(Mutation::Skip(false));
            }
            tables
                .refresh_tokens
                .insert(replacement.token.clone(), replacement);
            Ok(Mutation::Commit(true))
        })
        .await
    }

    async fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        let token = token.to_string();
        self.mutate(move |tables| {
            Ok(match tables.refresh_tokens.remove(&token) {
                Some(_) => Mutation::Commit(true),
                None => Mutation::Skip(false),
            })
        })
        .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.mutate(move |tables| {
            let before = tables.refresh_tokens.len();
            tables.refresh_tokens.retain(|_, record| !record.is_expired(now));
            let removed = before - tables.refresh_tokens.len();
            Ok(if removed == 0 {
                Mutation::Skip(0)
            } else {
                Mutation::Commit(removed)
            })
        })
        .await
    }
}
