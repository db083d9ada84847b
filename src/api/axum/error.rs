use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::GateError;

/// Converts `GateError` into an HTTP response.
///
/// Every gate error is a server-side fault, so the response is always a bare
/// 500; the details only go to the log.
#[derive(Debug)]
pub struct AppError(pub GateError);

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        log::error!(target: "gatehouse", "msg=\"request failed\" error=\"{}\"", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn test_error_response_hides_details() {
        let response =
            AppError(GateError::Verifier("ldap password=hunter2".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Internal Server Error");
    }
}
