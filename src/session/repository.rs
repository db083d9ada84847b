//! Session repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Session, SessionState};
use crate::GateError;

/// Storage backend for sessions, keyed by an opaque session ID.
///
/// Implementations must tolerate concurrent calls from many in-flight
/// requests.
///
/// - [`InMemorySessionRepository`](super::InMemorySessionRepository): process-local storage
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a new session and returns its ID.
    async fn create(
        &self,
        state: SessionState,
        expires_at: DateTime<Utc>,
    ) -> Result<String, GateError>;

    /// Finds a session by its ID. Expired sessions may still be returned.
    async fn find(&self, session_id: &str) -> Result<Option<Session>, GateError>;

    /// Replaces the state of an existing session.
    async fn save(&self, session_id: &str, state: &SessionState) -> Result<(), GateError>;

    /// Moves the expiry of an existing session.
    async fn extend(&self, session_id: &str, expires_at: DateTime<Utc>) -> Result<(), GateError>;

    /// Removes a session.
    async fn destroy(&self, session_id: &str) -> Result<(), GateError>;

    /// Removes all expired sessions.
    ///
    /// Returns the number of sessions pruned.
    async fn prune_expired(&self) -> Result<u64, GateError>;
}
