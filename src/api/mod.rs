//! Web framework adapters.

#[cfg(feature = "axum_support")]
pub mod axum;
