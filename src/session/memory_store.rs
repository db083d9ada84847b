//! In-memory session storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::repository::SessionRepository;
use super::{Session, SessionState};
use crate::GateError;
use crate::crypto::generate_session_id;

#[derive(Debug, Clone)]
struct Entry {
    state: SessionState,
    expires_at: DateTime<Utc>,
}

/// Stores sessions in a `HashMap` protected by a `RwLock`.
///
/// Clones share the same map. Sessions are lost when the process restarts,
/// which matches the lifetime of the default signing key. Expired entries
/// stay in the map until [`SessionRepository::prune_expired`] runs or a
/// request presents them.
#[derive(Clone)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of sessions currently stored.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> GateError {
    GateError::SessionStore("Lock poisoned".to_owned())
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(
        &self,
        state: SessionState,
        expires_at: DateTime<Utc>,
    ) -> Result<String, GateError> {
        let session_id = generate_session_id();

        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session_id.clone(), Entry { state, expires_at });

        Ok(session_id)
    }

    async fn find(&self, session_id: &str) -> Result<Option<Session>, GateError> {
        let sessions = self.sessions.read().map_err(poisoned)?;

        Ok(sessions.get(session_id).map(|entry| Session {
            id: session_id.to_owned(),
            state: entry.state.clone(),
            expires_at: entry.expires_at,
        }))
    }

    async fn save(&self, session_id: &str, state: &SessionState) -> Result<(), GateError> {
        if let Some(entry) = self
            .sessions
            .write()
            .map_err(poisoned)?
            .get_mut(session_id)
        {
            entry.state = state.clone();
        }

        Ok(())
    }

    async fn extend(&self, session_id: &str, expires_at: DateTime<Utc>) -> Result<(), GateError> {
        if let Some(entry) = self
            .sessions
            .write()
            .map_err(poisoned)?
            .get_mut(session_id)
        {
            entry.expires_at = expires_at;
        }

        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), GateError> {
        self.sessions.write().map_err(poisoned)?.remove(session_id);

        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn prune_expired(&self) -> Result<u64, GateError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;

        let now = Utc::now();
        let before_count = sessions.len();

        sessions.retain(|_, entry| entry.expires_at > now);

        let pruned = before_count.saturating_sub(sessions.len());
        Ok(u64::try_from(pruned).unwrap_or(u64::MAX))
    }
}
