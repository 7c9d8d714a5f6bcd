//! Persistent storage for the signed-in user record, keyed by storage scope.
//!
//! A scope identifies one browser, so each scope holds at most one record.
//! Backends are synchronous and internally synchronized; callers treat every
//! access as fallible.

use crate::auth::types::AuthUser;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, error, warn};
use ulid::Ulid;

#[derive(Debug)]
pub enum StorageError {
    InvalidScope(String),
    Io(io::Error),
    Serialization(serde_json::Error),
    Poisoned,
}

impl fmt::Display for StorageError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidScope(scope) => write!(formatter, "Invalid storage scope: {scope}"),
            StorageError::Io(err) => write!(formatter, "Storage I/O error: {err}"),
            StorageError::Serialization(err) => write!(formatter, "Storage encoding error: {err}"),
            StorageError::Poisoned => write!(formatter, "Storage lock poisoned"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(err) => Some(err),
            StorageError::Serialization(err) => Some(err),
            StorageError::InvalidScope(_) | StorageError::Poisoned => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err)
    }
}

pub trait UserStorage: Send + Sync {
    /// Returns the persisted record for `scope`, if any. Expired records read
    /// as absent.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read or the record is corrupt.
    fn read(&self, scope: &str) -> Result<Option<AuthUser>, StorageError>;

    /// Replaces the persisted record for `scope`.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written.
    fn write(&self, scope: &str, user: &AuthUser) -> Result<(), StorageError>;

    /// Removes the persisted record for `scope`. Missing records are not an error.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be modified.
    fn remove(&self, scope: &str) -> Result<(), StorageError>;

    /// Drops every expired record and returns how many were removed.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be listed or modified.
    fn purge_expired(&self) -> Result<usize, StorageError>;
}

/// A user record plus the moment it stops being valid (Unix milliseconds).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    user: AuthUser,
    #[serde(default)]
    expires_at: Option<u64>,
}

impl StoredUser {
    fn new(user: &AuthUser, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|ttl| {
            let ttl = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
            now_millis().saturating_add(ttl)
        });
        Self {
            user: user.clone(),
            expires_at,
        }
    }

    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Process-local storage, used when no storage directory is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, StoredUser>>,
    ttl: Option<Duration>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written from now on expire after `ttl`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Number of scopes with a persisted user, expired or not.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.len())
    }

    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.len().map(|len| len == 0)
    }
}

impl UserStorage for MemoryStorage {
    fn read(&self, scope: &str) -> Result<Option<AuthUser>, StorageError> {
        let now = now_millis();
        {
            let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
            match entries.get(scope) {
                None => return Ok(None),
                Some(stored) if !stored.is_expired(now) => return Ok(Some(stored.user.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it, unless a fresh write replaced it in the meantime.
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        if entries
            .get(scope)
            .is_some_and(|stored| stored.is_expired(now))
        {
            entries.remove(scope);
        }
        Ok(None)
    }

    fn write(&self, scope: &str, user: &AuthUser) -> Result<(), StorageError> {
        let stored = StoredUser::new(user, self.ttl);
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(scope.to_string(), stored);
        Ok(())
    }

    fn remove(&self, scope: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(scope);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, StorageError> {
        let now = now_millis();
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        let before = entries.len();
        entries.retain(|_, stored| !stored.is_expired(now));
        Ok(before - entries.len())
    }
}

/// One JSON file per scope under a directory, so records survive restarts.
///
/// Scopes must be ULIDs; anything else is rejected before touching the
/// filesystem. Expired files read as absent and are deleted by
/// [`UserStorage::purge_expired`].
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl FileStorage {
    /// Opens (and creates if needed) the storage directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, ttl: None })
    }

    /// Records written from now on expire after `ttl`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, scope: &str) -> Result<PathBuf, StorageError> {
        let scope = Ulid::from_string(scope)
            .map_err(|_| StorageError::InvalidScope(scope.to_string()))?;
        Ok(self.dir.join(format!("{scope}.json")))
    }

    fn load(path: &Path) -> Result<Option<StoredUser>, StorageError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn remove_if_present(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

impl UserStorage for FileStorage {
    fn read(&self, scope: &str) -> Result<Option<AuthUser>, StorageError> {
        let path = self.record_path(scope)?;
        Ok(Self::load(&path)?
            .filter(|stored| !stored.is_expired(now_millis()))
            .map(|stored| stored.user))
    }

    fn write(&self, scope: &str, user: &AuthUser) -> Result<(), StorageError> {
        let path = self.record_path(scope)?;
        let bytes = serde_json::to_vec(&StoredUser::new(user, self.ttl))?;

        // Write then rename so readers never see a half-written record. Each
        // write gets its own temp file so concurrent writers never share one.
        let tmp = self.dir.join(format!(".{}.{}.tmp", path_stem(&path), Ulid::new()));
        fs::write(&tmp, bytes)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn remove(&self, scope: &str) -> Result<(), StorageError> {
        remove_if_present(&self.record_path(scope)?)
    }

    fn purge_expired(&self) -> Result<usize, StorageError> {
        let now = now_millis();
        let mut purged = 0;

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match Self::load(&path) {
                Ok(Some(stored)) if stored.is_expired(now) => {
                    remove_if_present(&path)?;
                    purged += 1;
                }
                Ok(_) => {}
                Err(err) => warn!("Skipping unreadable record {}: {err}", path.display()),
            }
        }

        Ok(purged)
    }
}

fn path_stem(path: &Path) -> &str {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("record")
}

/// Periodically drops expired records from `storage` on the blocking pool.
pub fn spawn_sweeper(storage: Arc<dyn UserStorage>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(every).await;

            let storage = storage.clone();
            match tokio::task::spawn_blocking(move || storage.purge_expired()).await {
                Ok(Ok(0)) => {}
                Ok(Ok(purged)) => debug!("Purged {purged} expired user records"),
                Ok(Err(err)) => error!("Failed to purge expired user records: {err}"),
                Err(err) => error!("User record sweep task failed: {err}"),
            }
        }
    })
}
