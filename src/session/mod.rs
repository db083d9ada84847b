mod config;
mod cookie;
mod manager;
mod memory_store;
mod repository;

use chrono::{DateTime, Utc};
pub use config::{DEFAULT_COOKIE_NAME, SameSite, SessionConfig};
pub use self::cookie::{build_session_cookie, sign_session_id, verify_signed_cookie};
pub use manager::{LoadedSession, SessionManager};
pub use memory_store::InMemorySessionRepository;
pub use repository::SessionRepository;
use serde::{Deserialize, Serialize};

/// Who logged in, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    pub username: String,
    pub login_date: DateTime<Utc>,
}

/// Authentication state of one visitor.
///
/// The username and the login date are stored together, so a session is
/// either fully anonymous or fully authenticated; there is no way to hold
/// one without the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    login: Option<Login>,
}

impl SessionState {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(username: impl Into<String>, login_date: DateTime<Utc>) -> Self {
        Self {
            login: Some(Login {
                username: username.into(),
                login_date,
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.login.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.login.as_ref().map(|login| login.username.as_str())
    }

    pub fn login_date(&self) -> Option<DateTime<Utc>> {
        self.login.as_ref().map(|login| login.login_date)
    }

    /// Records a successful login, replacing any previous one.
    pub fn sign_in(&mut self, username: impl Into<String>, login_date: DateTime<Utc>) {
        self.login = Some(Login {
            username: username.into(),
            login_date,
        });
    }

    /// Clears the username and login date. A no-op on anonymous sessions.
    pub fn sign_out(&mut self) {
        self.login = None;
    }
}

/// A session as held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub state: SessionState,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
