//! Error types shared across the crate.

use thiserror::Error;

/// Client error taxonomy.
///
/// `NotFound` is its own variant because a 404 is benign for polling
/// endpoints (the session ended between ticks) but a real error for
/// explicit user actions; callers express that policy with a `match`
/// instead of inspecting status codes.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Server returned a 4xx/5xx with a message body; shown verbatim.
    #[error("API error: {0}")]
    Api(String),

    /// No live session / resource behind the requested endpoint.
    #[error("not found")]
    NotFound,

    /// Rejected locally before any request was issued.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport-level failure (DNS, TLS, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// True for errors the poller swallows rather than surfaces.
    pub fn is_benign_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_benign() {
        assert!(ClientError::NotFound.is_benign_not_found());
        assert!(!ClientError::Api("boom".into()).is_benign_not_found());
        assert!(!ClientError::Validation("missing ticker".into()).is_benign_not_found());
    }

    #[test]
    fn test_display_messages() {
        let e = ClientError::Api("strategy 42 does not exist".into());
        assert_eq!(e.to_string(), "API error: strategy 42 does not exist");

        let e = ClientError::Validation("initial capital must be positive".into());
        assert!(e.to_string().contains("initial capital"));
    }
}
