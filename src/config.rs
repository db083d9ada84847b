//! Gate configuration.
//!
//! A [`GateConfig`] is supplied once when the gate is built and never changes
//! afterwards.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use gatehouse::{FailurePolicy, GateConfig};
//!
//! let config = GateConfig {
//!     home_path: "/dashboard".to_owned(),
//!     secure_cookies: true,
//!     failure_policy: FailurePolicy::Delayed(Duration::from_secs(2)),
//!     ..GateConfig::new("/login.html")
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use crate::GateError;
use crate::session::SessionConfig;

/// Landing page after a successful login when none is configured.
pub const DEFAULT_HOME_PATH: &str = "/whoami";

/// How long a failed login waits before its redirect is sent.
pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_secs(4);

/// How the response to a failed or malformed login is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Respond right away.
    Immediate,
    /// Hold the response for the given duration before sending it.
    ///
    /// Only the failing request waits; other requests are unaffected.
    Delayed(Duration),
}

impl FailurePolicy {
    pub fn delay(self) -> Option<Duration> {
        match self {
            FailurePolicy::Immediate => None,
            FailurePolicy::Delayed(delay) if delay.is_zero() => None,
            FailurePolicy::Delayed(delay) => Some(delay),
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Delayed(DEFAULT_FAILURE_DELAY)
    }
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Path that serves the login form. Anonymous page requests are
    /// redirected here.
    pub login_path: String,

    /// Where a successful login lands.
    ///
    /// Default: `/whoami`
    pub home_path: String,

    /// Marks the session cookie `Secure` so browsers only send it over HTTPS.
    ///
    /// Default: `false`
    pub secure_cookies: bool,

    /// Default: delayed by four seconds.
    pub failure_policy: FailurePolicy,

    pub session: SessionConfig,
}

impl GateConfig {
    /// Creates a configuration with defaults for everything but the login path.
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            home_path: DEFAULT_HOME_PATH.to_owned(),
            secure_cookies: false,
            failure_policy: FailurePolicy::default(),
            session: SessionConfig::default(),
        }
    }

    /// Sets the landing page for successful logins.
    #[must_use]
    pub fn with_home_path(mut self, home_path: impl Into<String>) -> Self {
        self.home_path = home_path.into();
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Checks that both paths are absolute, usable as a `Location` header, and
    /// that the session settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Configuration`] naming the first offending field.
    pub fn validate(&self) -> Result<(), GateError> {
        if !self.login_path.starts_with('/') {
            return Err(GateError::Configuration(
                "login_path must start with '/'".to_owned(),
            ));
        }
        if !self.home_path.starts_with('/') {
            return Err(GateError::Configuration(
                "home_path must start with '/'".to_owned(),
            ));
        }
        for (field, path) in [("login_path", &self.login_path), ("home_path", &self.home_path)] {
            if !path.chars().all(|c| c.is_ascii_graphic()) {
                return Err(GateError::Configuration(format!(
                    "{field} must be printable ASCII without spaces"
                )));
            }
        }
        self.session.validate()
    }
}
