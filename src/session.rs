//! Session persistence across reloads.
//!
//! Restoring a session never touches the network. A file that cannot be read
//! back as a session counts as logged out.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::warn;

use crate::{error::ClientError, models::Session};

pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<Session>, ClientError>;
    fn save(&self, session: &Session) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// One JSON document on disk.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&text) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(path = %self.path.display(), "Discarding unreadable session: {e}");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // rename keeps a half-written file from ever being loaded
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    session: Mutex<Option<Session>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;

    fn session() -> Session {
        Session {
            participant_name: "Ana".into(),
            is_admin: true,
            login_timestamp: Utc::now(),
            session_id: "abc".into(),
        }
    }

    #[test]
    fn file_round_trip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("session.json"));

        assert_eq!(storage.load().unwrap(), None);
        storage.save(&session()).unwrap();
        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.participant_name, "Ana");
        assert!(loaded.is_admin);

        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
        storage.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_logged_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(FileStorage::new(path).load().unwrap(), None);
    }

    #[test]
    fn memory_storage() {
        let storage = MemoryStorage::new();
        storage.save(&session()).unwrap();
        assert!(storage.load().unwrap().is_some());
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }
}
