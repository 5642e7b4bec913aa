//! Durable storage for the session token and role
//!
//! The token and role are persisted together as one JSON document and
//! replaced with a single rename, so no reader ever sees one half of the
//! pair. A document holding only one half, an unknown role, or corrupt JSON
//! reads as "no session".

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use storefront_model::{Role, Session};

use crate::domains::auth::errors::StorageError;

/// Durable key/value storage for the session pair.
///
/// The only source of truth for whether a session is present. Reads are
/// synchronous so the bearer token can be attached before a request leaves.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Current session, or `None` when absent, partial, or unreadable.
    fn read(&self) -> Option<Session>;

    /// Replace the stored pair.
    fn write(&self, session: &Session) -> Result<(), StorageError>;

    /// Remove the stored pair. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<(), StorageError>;
}

/// On-disk layout. Both halves are optional so partial documents written by
/// older builds or by hand still parse and can be rejected explicitly.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    /// When this pair was written
    stored_at: DateTime<Utc>,
}

impl StoredSession {
    fn from_session(session: &Session) -> Self {
        Self {
            token: Some(session.token().to_string()),
            role: Some(session.role().to_string()),
            stored_at: Utc::now(),
        }
    }

    fn into_session(self) -> Option<Session> {
        let (Some(token), Some(role)) = (self.token, self.role) else {
            log::warn!(
                "[SessionStore] Ignoring partial session (stored at {})",
                self.stored_at
            );
            return None;
        };

        let role = match role.parse::<Role>() {
            Ok(role) => role,
            Err(err) => {
                log::warn!("[SessionStore] Ignoring stored session: {}", err);
                return None;
            }
        };

        Session::new(token, role)
            .map_err(|err| {
                log::warn!("[SessionStore] Ignoring stored session: {}", err)
            })
            .ok()
    }
}

/// File-backed session store that survives process restarts.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    /// Serializes write/clear within this process.
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(source) => {
                return Err(StorageError::ReadFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match serde_json::from_str(&data) {
            Ok(stored) => Ok(Some(stored)),
            Err(err) => {
                log::warn!(
                    "[SessionStore] Corrupt session file at {:?}: {}",
                    self.path,
                    err
                );
                Ok(None)
            }
        }
    }

    fn write_failed(&self, source: io::Error) -> StorageError {
        StorageError::WriteFailed {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn read(&self) -> Option<Session> {
        match self.load() {
            Ok(stored) => stored.and_then(StoredSession::into_session),
            Err(err) => {
                log::warn!("[SessionStore] Treating as no session: {}", err);
                None
            }
        }
    }

    fn write(&self, session: &Session) -> Result<(), StorageError> {
        let _guard = self.lock.lock();

        let json = serde_json::to_vec_pretty(&StoredSession::from_session(
            session,
        ))
        .map_err(StorageError::Serialize)?;

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| self.write_failed(e))?;

        // Temp file in the same directory so the rename stays atomic.
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| self.write_failed(e))?;
        tmp.write_all(&json).map_err(|e| self.write_failed(e))?;
        tmp.as_file().sync_all().map_err(|e| self.write_failed(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_failed(e.error))?;

        log::info!(
            "[SessionStore] Saved session for role {} to {:?}",
            session.role(),
            self.path
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock.lock();

        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("[SessionStore] Cleared session at {:?}", self.path);
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::RemoveFailed {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// In-memory store for tests and runs that should not touch disk.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self) -> Option<Session> {
        self.slot.lock().clone()
    }

    fn write(&self, session: &Session) -> Result<(), StorageError> {
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.slot.lock().take();
        Ok(())
    }
}
