//! In-process session registry.
//!
//! Sessions are keyed by id and exclusively owned: all access goes through
//! the registry lock, and the lock is never held across a network call.
//! A completion arriving for a removed session simply finds nothing.

use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::wizard::session::WizardSession;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, WizardSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: WizardSession) -> Uuid {
        let id = session.id;
        self.sessions.lock().await.insert(id, session);
        id
    }

    /// Runs `f` against the session, or returns `None` if it is closed.
    pub async fn with<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WizardSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(&id).map(f)
    }

    /// Closes a session, discarding its state.
    pub async fn remove(&self, id: Uuid) -> Option<WizardSession> {
        self.sessions.lock().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
