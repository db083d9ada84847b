//! Random token generation and the process-wide signing key.

use std::sync::OnceLock;

use rand::Rng;

use crate::SecretString;

/// Length of generated session identifiers, in characters.
pub const SESSION_ID_LENGTH: usize = 32;

/// Length of the generated cookie signing key, in characters.
pub const SIGNING_KEY_LENGTH: usize = 48;

static PROCESS_SIGNING_KEY: OnceLock<SecretString> = OnceLock::new();

/// Generates a random alphanumeric token.
///
/// ```rust
/// use gatehouse::crypto::generate_token;
///
/// let token = generate_token(32);
/// assert_eq!(token.len(), 32);
/// ```
pub fn generate_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.sample(rand::distributions::Alphanumeric)))
        .collect()
}

/// Generates a fresh session identifier.
pub fn generate_session_id() -> String {
    generate_token(SESSION_ID_LENGTH)
}

/// Returns the signing key shared by every gate in this process.
///
/// The key is generated on first use and never rotated. It lives only in
/// memory, so restarting the process invalidates every session cookie that
/// was issued before the restart.
pub fn process_signing_key() -> &'static SecretString {
    PROCESS_SIGNING_KEY.get_or_init(|| {
        log::info!(
            target: "gatehouse::session",
            "msg=\"generated process signing key\" length={SIGNING_KEY_LENGTH}"
        );
        SecretString::new(generate_token(SIGNING_KEY_LENGTH))
    })
}
