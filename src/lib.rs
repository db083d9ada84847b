//! Session-gated login for web servers.
//!
//! `gatehouse` authenticates a username/password pair against a
//! caller-supplied [`CredentialVerifier`], keeps the result in a cookie-backed
//! session, and redirects anonymous visitors that ask for HTML pages to the
//! login page. Static assets always pass through so the login page can load
//! its own stylesheets, scripts and images.
//!
//! The decision logic lives in [`RequestGate`] and does not depend on any web
//! framework. The `axum_support` feature (on by default) wires it into an
//! `axum::Router`:
//!
//! ```rust,ignore
//! use axum::Router;
//! use gatehouse::api::axum::setup_login;
//! use gatehouse::session::InMemorySessionRepository;
//! use gatehouse::{GateConfig, RequestGate};
//!
//! let gate = RequestGate::new(
//!     GateConfig::new("/login.html"),
//!     |username: &str, password: &str| username == "admin" && password == "hunter2",
//!     InMemorySessionRepository::new(),
//! )?;
//!
//! let app = setup_login(Router::new(), gate);
//! ```

use std::fmt;

pub mod api;
pub mod config;
pub mod crypto;
pub mod form;
pub mod gate;
pub mod path;
mod secret;
pub mod session;
pub mod verifier;

pub use config::{FailurePolicy, GateConfig};
pub use form::{Credentials, FieldMap, LoginInput, MalformedReason};
pub use gate::{GateOutcome, GateResponse, RequestGate, Route};
pub use path::{PathKind, classify_path};
pub use secret::SecretString;
pub use session::{SessionRepository, SessionState};
pub use verifier::CredentialVerifier;

/// Errors raised by the gate and its collaborators.
///
/// Rejected credentials and malformed login bodies are not errors: they are
/// ordinary gate outcomes. Everything here ends up as an internal server
/// error without details in the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The session store failed to read or write.
    SessionStore(String),
    /// The credential verifier failed instead of answering yes or no.
    Verifier(String),
    /// The gate was set up with an invalid configuration.
    Configuration(String),
    Internal(String),
}

impl std::error::Error for GateError {}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::SessionStore(msg) => write!(f, "Session store error: {msg}"),
            GateError::Verifier(msg) => write!(f, "Credential verifier failed: {msg}"),
            GateError::Configuration(msg) => write!(f, "Invalid configuration: {msg}"),
            GateError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}
