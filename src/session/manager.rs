//! Per-request session loading and persistence.

use ::cookie::Cookie;
use chrono::{DateTime, Utc};

use super::config::SessionConfig;
use super::cookie::{build_session_cookie, find_cookie_value, sign_session_id, verify_signed_cookie};
use super::repository::SessionRepository;
use super::SessionState;
use crate::GateError;

/// The session attached to one request.
///
/// Holds a copy of the state as loaded so [`SessionManager::commit`] only
/// writes back when something changed.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    id: Option<String>,
    original: SessionState,
    state: SessionState,
}

impl LoadedSession {
    fn existing(id: String, state: SessionState) -> Self {
        Self {
            id: Some(id),
            original: state.clone(),
            state,
        }
    }

    fn fresh() -> Self {
        Self {
            id: None,
            original: SessionState::anonymous(),
            state: SessionState::anonymous(),
        }
    }

    /// The store's ID for this session, `None` until it has been saved once.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_modified(&self) -> bool {
        self.state != self.original
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }
}

/// Reads and writes sessions for the gate.
///
/// Wraps a [`SessionRepository`] with the cookie transport: it resolves the
/// signed cookie of an incoming request to a session and, after the gate has
/// run, persists changes and hands back a cookie when a new session was
/// created.
pub struct SessionManager<R> {
    repository: R,
    config: SessionConfig,
    secure: bool,
}

impl<R: SessionRepository> SessionManager<R> {
    pub fn new(repository: R, config: SessionConfig, secure: bool) -> Self {
        Self {
            repository,
            config,
            secure,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolves the session for a request from its `Cookie` header.
    ///
    /// A missing, tampered, unknown, or expired cookie yields a fresh
    /// anonymous session. A live session has its expiry pushed forward.
    ///
    /// # Errors
    ///
    /// Fails only when the store itself fails.
    pub async fn load(&self, cookie_header: Option<&str>) -> Result<LoadedSession, GateError> {
        let Some(session_id) = cookie_header
            .and_then(|header| find_cookie_value(header, &self.config.cookie_name))
            .and_then(|value| verify_signed_cookie(&value, &self.config.secret_key))
        else {
            return Ok(LoadedSession::fresh());
        };

        let Some(session) = self.repository.find(&session_id).await? else {
            log::debug!(
                target: "gatehouse::session",
                "msg=\"session not found in store, starting fresh\""
            );
            return Ok(LoadedSession::fresh());
        };

        if session.is_expired() {
            log::debug!(target: "gatehouse::session", "msg=\"session expired, starting fresh\"");
            self.repository.destroy(&session.id).await?;
            return Ok(LoadedSession::fresh());
        }

        self.repository
            .extend(&session.id, self.next_expiry())
            .await?;
        Ok(LoadedSession::existing(session.id, session.state))
    }

    /// Persists the session after the gate has run.
    ///
    /// Returns the cookie to set on the response when a session was stored
    /// under a new ID. That happens for a new session, and for an existing
    /// one that just logged in: the old ID is destroyed so an identifier
    /// handed out before the login cannot be used afterwards.
    ///
    /// # Errors
    ///
    /// Fails when the store fails to write.
    pub async fn commit(
        &self,
        session: LoadedSession,
    ) -> Result<Option<Cookie<'static>>, GateError> {
        let modified = session.is_modified();
        let logged_in = modified && session.state.is_authenticated();

        match session.id {
            Some(id) if logged_in => {
                let cookie = self.issue(session.state).await?;
                self.repository.destroy(&id).await?;
                log::debug!(target: "gatehouse::session", "msg=\"session id rotated on login\"");
                Ok(Some(cookie))
            }
            Some(id) => {
                if modified {
                    self.repository.save(&id, &session.state).await?;
                }
                Ok(None)
            }
            None if modified || self.config.save_uninitialized => {
                Ok(Some(self.issue(session.state).await?))
            }
            None => Ok(None),
        }
    }

    /// Removes expired sessions from the store.
    ///
    /// Meant to be run periodically, e.g. from a background task.
    ///
    /// # Errors
    ///
    /// Fails when the store fails.
    pub async fn prune_expired(&self) -> Result<u64, GateError> {
        let pruned = self.repository.prune_expired().await?;
        log::info!(target: "gatehouse::session", "msg=\"pruned expired sessions\" count={pruned}");
        Ok(pruned)
    }

    async fn issue(&self, state: SessionState) -> Result<Cookie<'static>, GateError> {
        let id = self.repository.create(state, self.next_expiry()).await?;
        let signed = sign_session_id(&id, &self.config.secret_key);
        Ok(build_session_cookie(signed, &self.config, self.secure))
    }

    fn next_expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.config.session_lifetime
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::session::InMemorySessionRepository;

    fn manager(save_uninitialized: bool) -> SessionManager<InMemorySessionRepository> {
        let config = SessionConfig {
            save_uninitialized,
            ..Default::default()
        };
        SessionManager::new(InMemorySessionRepository::new(), config, false)
    }

    fn cookie_header(cookie: &Cookie<'_>) -> String {
        format!("{}={}", cookie.name(), cookie.value())
    }

    async fn logged_in(manager: &SessionManager<InMemorySessionRepository>) -> String {
        let mut session = manager.load(None).await.unwrap();
        session.state_mut().sign_in("alice", Utc::now());
        cookie_header(&manager.commit(session).await.unwrap().unwrap())
    }

    #[tokio::test]
    async fn test_load_without_cookie_is_fresh() {
        let manager = manager(true);
        let session = manager.load(None).await.unwrap();

        assert!(session.is_new());
        assert!(!session.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_commit_fresh_session_issues_cookie() {
        let manager = manager(true);
        let session = manager.load(None).await.unwrap();

        let cookie = manager.commit(session).await.unwrap().unwrap();
        assert_eq!(cookie.name(), "gatehouse.sid");
        assert_eq!(manager.repository().len(), 1);
    }

    #[tokio::test]
    async fn test_uninitialized_session_not_saved_by_default() {
        let manager = SessionManager::new(
            InMemorySessionRepository::new(),
            SessionConfig::default(),
            false,
        );
        let session = manager.load(None).await.unwrap();

        assert!(manager.commit(session).await.unwrap().is_none());
        assert!(manager.repository().is_empty());
    }

    #[tokio::test]
    async fn test_modified_session_saved_even_when_uninitialized_disabled() {
        let manager = manager(false);
        let mut session = manager.load(None).await.unwrap();
        session.state_mut().sign_in("alice", Utc::now());

        assert!(manager.commit(session).await.unwrap().is_some());
        assert_eq!(manager.repository().len(), 1);
    }

    #[tokio::test]
    async fn test_changes_visible_on_next_request() {
        let manager = manager(false);
        let header = logged_in(&manager).await;

        let session = manager.load(Some(&header)).await.unwrap();
        assert!(!session.is_new());
        assert_eq!(session.state().username(), Some("alice"));

        let mut session = session;
        session.state_mut().sign_out();
        assert!(manager.commit(session).await.unwrap().is_none());

        let session = manager.load(Some(&header)).await.unwrap();
        assert!(!session.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_login_rotates_session_id() {
        let manager = manager(true);
        let planted = manager
            .commit(manager.load(None).await.unwrap())
            .await
            .unwrap()
            .unwrap();
        let planted_header = cookie_header(&planted);

        let mut session = manager.load(Some(&planted_header)).await.unwrap();
        let planted_id = session.id().unwrap().to_owned();
        session.state_mut().sign_in("alice", Utc::now());
        let rotated = manager.commit(session).await.unwrap().unwrap();

        assert_ne!(rotated.value(), planted.value());
        assert!(manager.repository().find(&planted_id).await.unwrap().is_none());
        assert_eq!(manager.repository().len(), 1);

        let session = manager.load(Some(&planted_header)).await.unwrap();
        assert!(session.is_new());
        let session = manager.load(Some(&cookie_header(&rotated))).await.unwrap();
        assert_eq!(session.state().username(), Some("alice"));
    }

    #[tokio::test]
    async fn test_unmodified_existing_session_not_rewritten() {
        let manager = manager(true);
        let cookie = manager
            .commit(manager.load(None).await.unwrap())
            .await
            .unwrap()
            .unwrap();

        let session = manager.load(Some(&cookie_header(&cookie))).await.unwrap();
        assert!(!session.is_modified());
        assert!(manager.commit(session).await.unwrap().is_none());
        assert_eq!(manager.repository().len(), 1);
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_fresh() {
        let manager = manager(true);
        let header = format!("gatehouse.sid=forged.{}", "0".repeat(64));

        let session = manager.load(Some(&header)).await.unwrap();
        assert!(session.is_new());
    }

    #[tokio::test]
    async fn test_unknown_session_id_is_fresh() {
        let manager = manager(true);
        let signed = sign_session_id("gone", &manager.config().secret_key);
        let header = format!("gatehouse.sid={signed}");

        let session = manager.load(Some(&header)).await.unwrap();
        assert!(session.is_new());
    }

    #[tokio::test]
    async fn test_expired_session_is_fresh_and_destroyed() {
        let manager = manager(false);
        let id = manager
            .repository()
            .create(
                SessionState::authenticated("alice", Utc::now()),
                Utc::now() - Duration::minutes(1),
            )
            .await
            .unwrap();
        let header = format!(
            "gatehouse.sid={}",
            sign_session_id(&id, &manager.config().secret_key)
        );

        let session = manager.load(Some(&header)).await.unwrap();
        assert!(session.is_new());
        assert!(!session.state().is_authenticated());
        assert!(manager.repository().is_empty());
    }

    #[tokio::test]
    async fn test_load_extends_expiry() {
        let manager = manager(false);
        let id = manager
            .repository()
            .create(
                SessionState::authenticated("alice", Utc::now()),
                Utc::now() + Duration::minutes(1),
            )
            .await
            .unwrap();
        let header = format!(
            "gatehouse.sid={}",
            sign_session_id(&id, &manager.config().secret_key)
        );

        manager.load(Some(&header)).await.unwrap();

        let stored = manager.repository().find(&id).await.unwrap().unwrap();
        assert!(stored.expires_at > Utc::now() + Duration::hours(1));
    }

    #[tokio::test]
    async fn test_prune_expired() {
        let manager = manager(false);
        logged_in(&manager).await;
        manager
            .repository()
            .create(SessionState::anonymous(), Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(manager.prune_expired().await.unwrap(), 1);
        assert_eq!(manager.repository().len(), 1);
    }
}
