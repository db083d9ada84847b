use chrono::Duration;

use crate::crypto::process_signing_key;
use crate::{GateError, SecretString};

pub const DEFAULT_COOKIE_NAME: &str = "gatehouse.sid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    #[default]
    Lax,
    Strict,
}

/// Cookie transport settings for the session identifier.
///
/// The `Secure` attribute is not set here: it follows
/// [`GateConfig::secure_cookies`](crate::GateConfig::secure_cookies).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
    /// HMAC key for signing session identifiers.
    ///
    /// Defaults to the per-process random key, which means sessions do not
    /// survive a restart.
    pub secret_key: SecretString,
    /// Store and issue a cookie for sessions that are still anonymous.
    ///
    /// Default: `false`, so a session is only created once someone logs in
    /// and cookieless asset requests never reach the store.
    pub save_uninitialized: bool,
    /// Idle time after which a session expires. Every request that presents
    /// the session pushes the expiry forward.
    ///
    /// Default: 2 hours
    pub session_lifetime: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
            cookie_path: "/".to_owned(),
            cookie_domain: None,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
            secret_key: process_signing_key().clone(),
            save_uninitialized: false,
            session_lifetime: Duration::hours(2),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), GateError> {
        if self.cookie_name.is_empty() {
            return Err(GateError::Configuration(
                "cookie_name must not be empty".to_owned(),
            ));
        }
        if self.secret_key.is_empty() {
            return Err(GateError::Configuration(
                "secret_key must not be empty".to_owned(),
            ));
        }
        if self.secret_key.len() < 32 {
            return Err(GateError::Configuration(
                "secret_key should be at least 32 bytes".to_owned(),
            ));
        }
        if self.session_lifetime <= Duration::zero() {
            return Err(GateError::Configuration(
                "session_lifetime must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "gatehouse.sid");
        assert_eq!(config.cookie_path, "/");
        assert!(config.cookie_http_only);
        assert_eq!(config.cookie_same_site, SameSite::Lax);
        assert!(!config.save_uninitialized);
        assert_eq!(config.session_lifetime, Duration::hours(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_uses_process_key() {
        let a = SessionConfig::default();
        let b = SessionConfig::default();
        assert_eq!(a.secret_key, b.secret_key);
    }

    #[test]
    fn test_validate_empty_secret() {
        let config = SessionConfig {
            secret_key: SecretString::new(""),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_short_secret() {
        let config = SessionConfig {
            secret_key: SecretString::new("short"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_cookie_name() {
        let config = SessionConfig {
            cookie_name: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_non_positive_lifetime() {
        let config = SessionConfig {
            session_lifetime: Duration::zero(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(GateError::Configuration(
                "session_lifetime must be positive".to_owned()
            ))
        );
    }
}
