//! Signed cookie helpers for the session identifier.
//!
//! Session IDs are signed with HMAC-SHA256, so a client cannot pick or forge
//! an identifier.

use ::cookie::{Cookie, SameSite as CookieSameSite};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::config::{SameSite, SessionConfig};
use crate::SecretString;

type HmacSha256 = Hmac<Sha256>;

/// Signs a session ID with HMAC-SHA256.
///
/// Returns a string in the format `{session_id}.{signature}`.
pub fn sign_session_id(session_id: &str, secret: &SecretString) -> String {
    let signature = compute_hmac(session_id.as_bytes(), secret.expose_secret().as_bytes());
    format!("{}.{}", session_id, hex::encode(signature))
}

/// Verifies a signed cookie value and extracts the session ID.
///
/// Returns `None` if the value is malformed or the signature does not match.
pub fn verify_signed_cookie(cookie_value: &str, secret: &SecretString) -> Option<String> {
    let (session_id, signature_hex) = cookie_value.rsplit_once('.')?;

    let actual_sig = hex::decode(signature_hex).ok()?;
    let expected_sig = compute_hmac(session_id.as_bytes(), secret.expose_secret().as_bytes());

    if constant_time_eq(&expected_sig, &actual_sig) {
        Some(session_id.to_owned())
    } else {
        log::warn!(
            target: "gatehouse::session",
            "msg=\"session cookie signature mismatch\" cookie_prefix=\"{}...\"",
            cookie_value.chars().take(8).collect::<String>()
        );
        None
    }
}

/// Finds the named cookie in a `Cookie` request header.
pub fn find_cookie_value(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

/// Builds the `Set-Cookie` value carrying a signed session ID.
///
/// The cookie has no `Max-Age`: it lasts for the browser session and expiry
/// is left to the store.
pub fn build_session_cookie(
    signed_value: String,
    config: &SessionConfig,
    secure: bool,
) -> Cookie<'static> {
    let same_site = match config.cookie_same_site {
        SameSite::None => CookieSameSite::None,
        SameSite::Lax => CookieSameSite::Lax,
        SameSite::Strict => CookieSameSite::Strict,
    };

    let mut builder = Cookie::build((config.cookie_name.clone(), signed_value))
        .path(config.cookie_path.clone())
        .secure(secure)
        .http_only(config.cookie_http_only)
        .same_site(same_site);

    if let Some(ref domain) = config.cookie_domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

fn compute_hmac(message: &[u8], key: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so this cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
