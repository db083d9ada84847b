//! The credential verifier boundary.

use async_trait::async_trait;

use crate::{GateError, SecretString};

/// Decides whether a username/password pair is valid.
///
/// The gate never looks at how the check is made. Plain closures of type
/// `Fn(&str, &str) -> bool` implement this trait, which covers most uses:
///
/// ```rust
/// use gatehouse::CredentialVerifier;
///
/// fn accepts<V: CredentialVerifier>(_: &V) {}
///
/// accepts(&|username: &str, password: &str| username == "admin" && password == "hunter2");
/// ```
///
/// Implement the trait directly for verifiers that call out to another
/// service. Such a verifier returns `Err` when it cannot reach a verdict;
/// the gate passes that error on instead of treating it as a rejection.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &SecretString) -> Result<bool, GateError>;
}

#[async_trait]
impl<F> CredentialVerifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    async fn verify(&self, username: &str, password: &SecretString) -> Result<bool, GateError> {
        Ok(self(username, password.expose_secret()))
    }
}
