//! Session middleware configuration.
//!
//! Sets up sessions using tower-sessions, persisted as files so a client's id
//! survives a restart. The session only holds the client id; cart contents
//! live in the durable per-client store.

use std::path::PathBuf;

use async_trait::async_trait;
use kiosk_core::cart::{SnapshotStore, StoreError};
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::StorefrontConfig;
use crate::storage::FileStore;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "kiosk_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Session store keeping one JSON record per session id.
///
/// Session ids render as URL-safe base64, which is a valid [`FileStore`] key.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    files: FileStore,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            files: FileStore::new(dir),
        }
    }

    /// Run a file operation on the blocking thread pool.
    async fn blocking<T, F>(&self, op: F) -> session_store::Result<T>
    where
        F: FnOnce(&FileStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let files = self.files.clone();
        tokio::task::spawn_blocking(move || op(&files))
            .await
            .map_err(|e| session_store::Error::Backend(e.to_string()))?
            .map_err(|e| session_store::Error::Backend(e.to_string()))
    }

    async fn exists(&self, id: Id) -> session_store::Result<bool> {
        let key = id.to_string();
        Ok(self.blocking(move |files| files.read(&key)).await?.is_some())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.exists(record.id).await? {
            record.id = Id::default();
        }
        self.save(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let key = record.id.to_string();
        let json = serde_json::to_string(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;
        self.blocking(move |files| files.write(&key, &json)).await
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let key = session_id.to_string();
        let Some(json) = self.blocking(move |files| files.read(&key)).await? else {
            return Ok(None);
        };

        let record: Record = serde_json::from_str(&json)
            .map_err(|e| session_store::Error::Decode(e.to_string()))?;
        Ok(Some(record).filter(|r| r.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        let key = session_id.to_string();
        self.blocking(move |files| files.remove(&key)).await
    }
}

/// Create the session layer backed by the configured session directory.
///
/// # Arguments
///
/// * `config` - Storefront configuration (session directory and the
///   `Secure` cookie flag)
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<FileSessionStore> {
    SessionManagerLayer::new(FileSessionStore::new(&config.session_dir))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::cookie::time::Duration;

    use super::*;

    fn record(expires_in: Duration) -> Record {
        Record {
            id: Id::default(),
            data: std::collections::HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_records_survive_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = record(Duration::hours(1));
        session
            .data
            .insert("client_id".to_string(), serde_json::json!("abc"));

        FileSessionStore::new(dir.path())
            .create(&mut session)
            .await
            .unwrap();

        let reopened = FileSessionStore::new(dir.path());
        let loaded = reopened.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, session.data);

        reopened.delete(&session.id).await.unwrap();
        assert!(reopened.load(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_records_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        let session = record(Duration::hours(-1));

        store.save(&session).await.unwrap();
        assert!(store.load(&session.id).await.unwrap().is_none());
    }
}
