//! Request path classification.
//!
//! Only requests that are likely to render a full page are sent to the login
//! page. Everything with a non-`html` extension is treated as a static asset
//! and always passes, so the login page can load its own CSS, scripts and
//! images before anyone has logged in.

/// What a request path most likely asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// No extension, or the `html` extension.
    Html,
    /// Any other extension (`css`, `js`, `png`, ...).
    Asset,
}

impl PathKind {
    pub fn is_html(self) -> bool {
        matches!(self, PathKind::Html)
    }
}

/// Classifies a request path by the text after its last `.`.
///
/// The split covers the whole path, not only the final segment, and the
/// comparison is case-sensitive: `/page.HTML` is an asset.
///
/// ```rust
/// use gatehouse::{PathKind, classify_path};
///
/// assert_eq!(classify_path("/reports"), PathKind::Html);
/// assert_eq!(classify_path("/report.html"), PathKind::Html);
/// assert_eq!(classify_path("/logo.png"), PathKind::Asset);
/// ```
pub fn classify_path(path: &str) -> PathKind {
    match path.rsplit_once('.') {
        None => PathKind::Html,
        Some((_, "html")) => PathKind::Html,
        Some(_) => PathKind::Asset,
    }
}
