//! services/app/src/adapters/session_file.rs
//!
//! A durable implementation of the `SessionStore` port. The session is kept in
//! one JSON document with the fixed keys `token` and `user`, replaced through a
//! temporary file and a rename so readers never observe a partial session.

use async_trait::async_trait;
use empathy_core::domain::{Session, UserId};
use empathy_core::ports::{PortError, PortResult, SessionStore};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

//=========================================================================================
// "Impure" Stored Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct StoredSession {
    token: Option<String>,
    user: Option<StoredUser>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    id: Option<UserId>,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

impl StoredSession {
    fn from_domain(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            user: Some(StoredUser {
                id: session.user_id,
                first_name: session.first_name.clone(),
                last_name: session.last_name.clone(),
            }),
        }
    }

    fn to_domain(self) -> Session {
        let user = self.user.unwrap_or(StoredUser {
            id: None,
            first_name: String::new(),
            last_name: String::new(),
        });
        Session {
            token: self.token,
            user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
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

fn storage_error(e: impl ToString) -> PortError {
    PortError::Storage(e.to_string())
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &Session) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let json = serde_json::to_vec_pretty(&StoredSession::from_domain(session))
            .map_err(storage_error)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await.map_err(storage_error)?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(storage_error)?;

        info!("Session saved for user {:?}", session.user_id);
        Ok(())
    }

    async fn load(&self) -> PortResult<Option<Session>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(e)),
        };

        match serde_json::from_slice::<StoredSession>(&bytes) {
            Ok(stored) => Ok(Some(stored.to_domain())),
            Err(e) => {
                // An unreadable session is treated as no session.
                warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    async fn clear(&self) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn session(token: &str) -> Session {
        Session {
            token: Some(token.to_string()),
            user_id: Some(1),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn save_overwrites_and_survives_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::new(&path);
        store.save(&session("T1")).await.unwrap();
        store.save(&session("T2")).await.unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.load().await.unwrap(), Some(session("T2")));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn file_uses_token_and_user_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session("T")).await.unwrap();

        let raw: Value = serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token"], "T");
        assert_eq!(raw["user"]["id"], 1);
        assert_eq!(raw["user"]["firstName"], "A");
    }

    #[tokio::test]
    async fn clear_then_load_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session("T")).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = FileSessionStore::new(&path);
        assert_eq!(store.load().await.unwrap(), None);
    }
}
