use thiserror::Error;

/// Errors surfaced by a navigation.
///
/// Re-entrant navigations are not errors; they resolve to
/// [`Outcome::Dropped`](crate::Outcome::Dropped).
#[derive(Debug, Error)]
pub enum SlickError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("malformed navigation response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("document has no {0} marker")]
    MissingMarker(&'static str),

    #[error("DOM operation failed: {0}")]
    Dom(String),

    #[error("history update failed: {0}")]
    History(String),

    #[error("markup could not be parsed: {0}")]
    Markup(String),

    #[error("resource {url} failed to load")]
    Resource { url: String },
}

pub type Result<T, E = SlickError> = std::result::Result<T, E>;
