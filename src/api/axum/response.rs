use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};

use crate::{GateError, GateResponse};

/// Writes a [`GateResponse`] as an axum response.
///
/// 3xx statuses become ordinary redirects. Any other status that carries a
/// redirect target keeps its status code and adds both a `Location` and a
/// `Refresh: 0; url=...` header, so browsers move on to the target while
/// scripts still see the 200, 400 or 401. Responses without a redirect are
/// HTML pages.
///
/// # Errors
///
/// Fails if the redirect target cannot be used as a header value.
pub fn into_http_response(gate_response: GateResponse) -> Result<Response, GateError> {
    let GateResponse {
        status,
        redirect,
        body,
        ..
    } = gate_response;

    let Some(location) = redirect else {
        return Ok((status, Html(body.unwrap_or_default())).into_response());
    };

    let body = body.unwrap_or_else(|| format!("Redirecting to {location}"));
    let location_header = header_value(&location)?;

    if status.is_redirection() {
        return Ok((status, [(header::LOCATION, location_header)], body).into_response());
    }

    let refresh_header = header_value(&format!("0; url={location}"))?;
    Ok((
        status,
        [
            (header::LOCATION, location_header),
            (header::REFRESH, refresh_header),
        ],
        body,
    )
        .into_response())
}

fn header_value(value: &str) -> Result<HeaderValue, GateError> {
    HeaderValue::from_str(value)
        .map_err(|e| GateError::Internal(format!("invalid redirect target: {e}")))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_plain_redirect() {
        let response = into_http_response(GateResponse::redirect("/login.html")).unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/login.html");
        assert!(response.headers().get(header::REFRESH).is_none());
        assert_eq!(body_text(response).await, "Redirecting to /login.html");
    }

    #[tokio::test]
    async fn test_status_with_redirect() {
        let response = into_http_response(GateResponse::redirect_with_status(
            StatusCode::UNAUTHORIZED,
            "/login.html",
        ))
        .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::LOCATION], "/login.html");
        assert_eq!(response.headers()[header::REFRESH], "0; url=/login.html");
    }

    #[tokio::test]
    async fn test_page() {
        let response = into_http_response(GateResponse::page("Username: (none)")).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        assert_eq!(body_text(response).await, "Username: (none)");
    }

    #[test]
    fn test_invalid_location_is_an_error() {
        let result = into_http_response(GateResponse::redirect("/bad\nheader"));
        assert!(matches!(result, Err(GateError::Internal(_))));
    }
}
