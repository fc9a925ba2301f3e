//! Errors raised while performing a background cart action.
//!
//! None of these reach the page: the interceptors turn every one of them
//! into an error toast.

use thiserror::Error;

/// Errors that can occur before a usable response arrives.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The request could not be sent or the connection failed.
    #[error("Cart request failed: {0}")]
    Transport(String),

    /// The endpoint could not be resolved to an absolute URL.
    #[error("Invalid cart endpoint {0}: {1}")]
    InvalidEndpoint(String, String),

    /// The triggering element lacks an attribute needed to build the request.
    #[error("Element is missing the `{0}` attribute")]
    MissingAttribute(&'static str),
}

impl From<reqwest::Error> for ActionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
