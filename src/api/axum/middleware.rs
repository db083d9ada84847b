//! The gate as an axum middleware.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::{self, Next};
use axum::response::Response;

use super::error::AppError;
use super::response::into_http_response;
use crate::session::LoadedSession;
use crate::{
    CredentialVerifier, GateError, GateOutcome, LoginInput, RequestGate, Route, SessionRepository,
};

/// Largest login body the gate reads. Bigger bodies count as malformed.
pub const MAX_LOGIN_BODY_BYTES: usize = 16 * 1024;

/// Installs the gate in front of every route of `router`.
///
/// Add the application's routes (and fallback, if any) first: the gate then
/// sees every request, including those for `/login`, `/logout` and
/// `/whoami`, which it answers itself.
///
/// # Example
///
/// ```rust,ignore
/// use axum::Router;
/// use axum::routing::get;
/// use gatehouse::api::axum::setup_login;
/// use gatehouse::session::InMemorySessionRepository;
/// use gatehouse::{GateConfig, RequestGate};
///
/// let gate = RequestGate::new(
///     GateConfig::new("/login.html"),
///     |user: &str, pass: &str| user == "admin" && pass == "hunter2",
///     InMemorySessionRepository::new(),
/// )?;
///
/// let app = setup_login(
///     Router::new().route("/login.html", get(login_page)).route("/", get(index)),
///     gate,
/// );
/// ```
pub fn setup_login<S, V, R>(router: Router<S>, gate: RequestGate<V, R>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    V: CredentialVerifier + 'static,
    R: SessionRepository + 'static,
{
    router.layer(middleware::from_fn_with_state(
        Arc::new(gate),
        gate_middleware::<V, R>,
    ))
}

/// Runs the gate for one request.
///
/// The session is loaded from the cookie, the gate decides, changes are
/// written back, and a cookie is set when a new session was stored. Requests
/// that pass the gate reach the application with the current
/// [`SessionState`](crate::SessionState) in their extensions.
///
/// Failed logins under a delayed [`FailurePolicy`](crate::FailurePolicy)
/// wait here before the response is returned; the wait only suspends this
/// request.
pub async fn gate_middleware<V, R>(
    State(gate): State<Arc<RequestGate<V, R>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    V: CredentialVerifier + 'static,
    R: SessionRepository + 'static,
{
    let cookies = cookie_header(request.headers());

    let mut session = gate.sessions().load(cookies.as_deref()).await?;
    let route = gate.route(request.method(), request.uri().path());

    let outcome = match route {
        Route::LoginSubmit => {
            let input = read_login_input(request).await;
            let outcome = gate.login(session.state_mut(), input).await?;
            return finish(gate.as_ref(), session, outcome).await;
        }
        Route::Logout => gate.logout(session.state_mut()),
        Route::Identity => gate.identity(session.state()),
        Route::LoginPage | Route::Other(_) => gate.guard(session.state(), route),
    };

    if outcome == GateOutcome::Continue {
        request.extensions_mut().insert(session.state().clone());
        let mut response = next.run(request).await;
        if let Some(cookie) = gate.sessions().commit(session).await? {
            append_cookie(&mut response, &cookie.to_string())?;
        }
        return Ok(response);
    }

    finish(gate.as_ref(), session, outcome).await
}

async fn finish<V, R>(
    gate: &RequestGate<V, R>,
    session: LoadedSession,
    outcome: GateOutcome,
) -> Result<Response, AppError>
where
    V: CredentialVerifier,
    R: SessionRepository,
{
    let GateOutcome::Respond(gate_response) = outcome else {
        return Err(AppError(GateError::Internal(
            "gate outcome has no response".to_owned(),
        )));
    };
    let delay = gate_response.delay;

    let mut response = into_http_response(gate_response)?;
    if let Some(cookie) = gate.sessions().commit(session).await? {
        append_cookie(&mut response, &cookie.to_string())?;
    }

    if let Some(delay) = delay {
        log::debug!(
            target: "gatehouse",
            "msg=\"delaying failed login response\" delay_ms={}",
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }

    Ok(response)
}

async fn read_login_input(request: Request) -> LoginInput {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);

    match axum::body::to_bytes(request.into_body(), MAX_LOGIN_BODY_BYTES).await {
        Ok(bytes) => LoginInput::from_body(content_type.as_deref(), &bytes),
        Err(err) => {
            log::debug!(target: "gatehouse", "msg=\"unreadable login body\" error=\"{err}\"");
            LoginInput::from_body(None, &[])
        }
    }
}

/// Joins every `Cookie` header into one. HTTP/2 clients may send each
/// cookie in a header of its own.
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}

fn append_cookie(response: &mut Response, cookie: &str) -> Result<(), GateError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| GateError::Internal(format!("invalid session cookie: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_joins_all_fields() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("gatehouse.sid=abc.def"));

        assert_eq!(
            cookie_header(&headers).as_deref(),
            Some("theme=dark; gatehouse.sid=abc.def")
        );
    }

    #[test]
    fn test_cookie_header_absent() {
        assert_eq!(cookie_header(&HeaderMap::new()), None);
    }
}
