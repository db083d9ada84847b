//! The request gate.
//!
//! Every request is routed to exactly one of the gate's operations, in this
//! order of precedence:
//!
//! 1. `POST /login`: [`RequestGate::login`]
//! 2. `GET` or `POST /logout`: [`RequestGate::logout`]
//! 3. `GET /whoami`: [`RequestGate::identity`]
//! 4. the configured login page: [`RequestGate::guard`]
//! 5. anything else: [`RequestGate::guard`]
//!
//! The gate works on a [`SessionState`] and returns a [`GateOutcome`]; it
//! never touches cookies or the network. Framework adapters in
//! [`crate::api`] load the session, run the gate, and write the outcome.

use std::time::Duration;

use chrono::Utc;
use http::{Method, StatusCode};

use crate::config::GateConfig;
use crate::form::LoginInput;
use crate::path::{PathKind, classify_path};
use crate::session::{SessionManager, SessionRepository, SessionState};
use crate::verifier::CredentialVerifier;
use crate::GateError;

/// Path that receives login submissions.
pub const LOGIN_SUBMIT_PATH: &str = "/login";
/// Path that clears the session.
pub const LOGOUT_PATH: &str = "/logout";
/// Path that shows who is logged in.
pub const IDENTITY_PATH: &str = "/whoami";
/// Where already-authenticated visitors of the login page are sent.
pub const ROOT_PATH: &str = "/";

/// Which gate operation handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    LoginSubmit,
    Logout,
    Identity,
    LoginPage,
    Other(PathKind),
}

/// What the gate decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Hand the request to the application unchanged.
    Continue,
    /// Answer the request without involving the application.
    Respond(GateResponse),
}

/// A response produced by the gate itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    pub status: StatusCode,
    /// Target the client should navigate to next.
    pub redirect: Option<String>,
    pub body: Option<String>,
    /// How long to hold the response before sending it.
    pub delay: Option<Duration>,
}

impl GateResponse {
    /// A plain `302 Found` redirect.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::redirect_with_status(StatusCode::FOUND, location)
    }

    /// A redirect that reports `status` instead of a 3xx code.
    pub fn redirect_with_status(status: StatusCode, location: impl Into<String>) -> Self {
        Self {
            status,
            redirect: Some(location.into()),
            body: None,
            delay: None,
        }
    }

    /// A `200 OK` page.
    pub fn page(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            redirect: None,
            body: Some(body.into()),
            delay: None,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Option<Duration>) -> Self {
        self.delay = delay;
        self
    }
}

/// Session-gated access control.
///
/// Owns the configuration, the credential verifier, and the session manager.
/// Build it once at startup and share it (it is usually wrapped in an `Arc`
/// by the framework adapter).
pub struct RequestGate<V, R> {
    config: GateConfig,
    verifier: V,
    sessions: SessionManager<R>,
}

impl<V, R> RequestGate<V, R>
where
    V: CredentialVerifier,
    R: SessionRepository,
{
    /// Validates the configuration and assembles the gate.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Configuration`] when the configuration is invalid.
    pub fn new(config: GateConfig, verifier: V, repository: R) -> Result<Self, GateError> {
        config.validate()?;
        let sessions = SessionManager::new(repository, config.session.clone(), config.secure_cookies);

        Ok(Self {
            config,
            verifier,
            sessions,
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager<R> {
        &self.sessions
    }

    /// Picks the operation responsible for a request.
    ///
    /// Paths match case-insensitively and a single trailing `/` is ignored,
    /// so `/Logout/` is the logout route.
    pub fn route(&self, method: &Method, path: &str) -> Route {
        if *method == Method::POST && same_route(path, LOGIN_SUBMIT_PATH) {
            Route::LoginSubmit
        } else if (*method == Method::GET || *method == Method::POST)
            && same_route(path, LOGOUT_PATH)
        {
            Route::Logout
        } else if *method == Method::GET && same_route(path, IDENTITY_PATH) {
            Route::Identity
        } else if same_route(path, &self.config.login_path) {
            Route::LoginPage
        } else {
            Route::Other(classify_path(path))
        }
    }

    /// Handles a login submission.
    ///
    /// Malformed input answers 400 and rejected credentials answer 401, both
    /// pointing back at the login page and both held back according to the
    /// configured [`FailurePolicy`](crate::FailurePolicy). The session is only
    /// touched on success.
    ///
    /// # Errors
    ///
    /// Passes on the verifier's error when it could not decide.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "gate_login", skip_all, err)
    )]
    pub async fn login(
        &self,
        session: &mut SessionState,
        input: LoginInput,
    ) -> Result<GateOutcome, GateError> {
        let credentials = match input {
            LoginInput::Valid(credentials) => credentials,
            LoginInput::Invalid(reason) => {
                log::warn!(
                    target: "gatehouse",
                    "msg=\"malformed login submission\" reason=\"{reason}\""
                );
                return Ok(self.failure(StatusCode::BAD_REQUEST));
            }
        };

        let accepted = self
            .verifier
            .verify(&credentials.username, &credentials.password)
            .await
            .inspect_err(|err| {
                log::error!(target: "gatehouse", "msg=\"credential verifier failed\" error=\"{err}\"");
            })?;

        if accepted {
            session.sign_in(credentials.username.as_str(), Utc::now());
            log::info!(
                target: "gatehouse",
                "msg=\"login success\" username=\"{}\"",
                credentials.username
            );
            Ok(GateOutcome::Respond(GateResponse::redirect_with_status(
                StatusCode::OK,
                self.config.home_path.clone(),
            )))
        } else {
            log::info!(
                target: "gatehouse",
                "msg=\"login rejected\" username=\"{}\"",
                credentials.username
            );
            Ok(self.failure(StatusCode::UNAUTHORIZED))
        }
    }

    /// Clears the session and sends the visitor to the login page.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "gate_logout", skip_all))]
    pub fn logout(&self, session: &mut SessionState) -> GateOutcome {
        if let Some(username) = session.username() {
            log::info!(target: "gatehouse", "msg=\"logout\" username=\"{username}\"");
        }
        session.sign_out();
        GateOutcome::Respond(GateResponse::redirect(self.config.login_path.clone()))
    }

    /// Renders the current username and login time.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "gate_identity", skip_all))]
    pub fn identity(&self, session: &SessionState) -> GateOutcome {
        GateOutcome::Respond(GateResponse::page(render_identity(session)))
    }

    /// Applies the login-page guard and the global gate.
    ///
    /// On the login page itself, authenticated visitors are sent to `/`
    /// unless the login page is `/`. Elsewhere, anonymous visitors asking
    /// for an HTML-like path are sent to the login page. Everything else
    /// continues.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "gate_guard", skip(self, session))
    )]
    pub fn guard(&self, session: &SessionState, route: Route) -> GateOutcome {
        match route {
            Route::LoginPage
                if session.is_authenticated() && self.config.login_path != ROOT_PATH =>
            {
                GateOutcome::Respond(GateResponse::redirect(ROOT_PATH))
            }
            Route::Other(kind) if kind.is_html() && !session.is_authenticated() => {
                GateOutcome::Respond(GateResponse::redirect(self.config.login_path.clone()))
            }
            _ => GateOutcome::Continue,
        }
    }

    fn failure(&self, status: StatusCode) -> GateOutcome {
        GateOutcome::Respond(
            GateResponse::redirect_with_status(status, self.config.login_path.clone())
                .with_delay(self.config.failure_policy.delay()),
        )
    }
}

fn same_route(path: &str, route: &str) -> bool {
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() && !route.ends_with('/') => trimmed,
        _ => path,
    };
    path.eq_ignore_ascii_case(route)
}

/// Absent values render as `(none)`. The username is HTML-escaped.
fn render_identity(session: &SessionState) -> String {
    let username = session
        .username()
        .map_or_else(|| "(none)".to_owned(), escape_html);
    let login_date = session
        .login_date()
        .map_or_else(|| "(none)".to_owned(), |date| date.to_rfc2822());

    format!("Username: {username} <br> Logged in: {login_date}")
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
