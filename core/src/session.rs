//! Token store.
//!
//! # Design
//! The session is one record, so it is loaded, saved and cleared as a unit.
//! Stores are injected into `HttpClient` rather than reached through a
//! global, which lets tests run several isolated sessions side by side.
//! Concurrent writers are last-write-wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::ApiError;
use crate::types::Session;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, ApiError>;
    async fn save(&self, session: &Session) -> Result<(), ApiError>;
    async fn clear(&self) -> Result<(), ApiError>;
}

/// In-process store. Each instance is independent.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, ApiError> {
        Ok(self.session.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn save(&self, session: &Session) -> Result<(), ApiError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Session persisted as a single JSON document.
///
/// Saves go to a sibling temp file which is then renamed over the target,
/// so a reader sees either the old record or the new one.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn storage_error(context: &str, path: &Path, err: impl std::fmt::Display) -> ApiError {
    ApiError::Storage(format!("{context} {}: {err}", path.display()))
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, ApiError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error("reading", &self.path, e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| storage_error("parsing", &self.path, e))
    }

    async fn save(&self, session: &Session) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("creating", parent, e))?;
        }
        let body = serde_json::to_string(session).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, body)
            .await
            .map_err(|e| storage_error("writing", &temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| storage_error("replacing", &self.path, e))?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("removing", &self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;

    fn session(token: &str) -> Session {
        Session {
            token: token.to_string(),
            account_type: AccountType::Officer,
            user_id: "OFF001".to_string(),
            user_name: "John Smith".to_string(),
        }
    }

    #[tokio::test]
    async fn memory_store_lifecycle() {
        let store = MemorySessionStore::new();
        assert!(store.load().await.unwrap().is_none());
        store.save(&session("a")).await.unwrap();
        store.save(&session("b")).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().token, "b");
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_stores_are_isolated() {
        let a = MemorySessionStore::with_session(session("a"));
        let b = MemorySessionStore::new();
        assert!(a.load().await.unwrap().is_some());
        assert!(b.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.load().await.unwrap().is_none());

        store.save(&session("abc.def.ghi")).await.unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["token"], "abc.def.ghi");
        assert_eq!(doc["accountType"], "officer");
        assert_eq!(doc["userId"], "OFF001");
        assert_eq!(doc["userName"], "John Smith");
        assert!(!store.temp_path().exists());

        let reopened = FileSessionStore::new(store.path());
        assert_eq!(reopened.load().await.unwrap(), Some(session("abc.def.ghi")));

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_reports_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{\"token\":").unwrap();
        let err = FileSessionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
    }
}
