//! services/app/src/adapters/session_memory.rs
//!
//! A process-local `SessionStore`, used when nothing should touch the disk.

use async_trait::async_trait;
use empathy_core::domain::Session;
use empathy_core::ports::{PortResult, SessionStore};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &Session) -> PortResult<()> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn load(&self) -> PortResult<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn clear(&self) -> PortResult<()> {
        *self.session.write().await = None;
        Ok(())
    }
}
