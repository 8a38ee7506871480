//! Error taxonomy shared by the locator, quota client, and controller.

use thiserror::Error;

/// Failure of a single quota request/response exchange
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request could not be sent or the connection failed
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The companion did not answer within the request timeout
    #[error("request timed out")]
    Timeout,

    /// The companion answered with a non-success status
    #[error("unexpected status {0}")]
    Status(u16),

    /// The response body was not a decodable quota payload
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(err)
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// Conditions that end a refresh cycle in the error display state.
///
/// All of them are recoverable: the next timer tick or manual refresh gets a
/// fresh chance. The display text is intentionally short because it ends up
/// in a one-line status bar.
#[derive(Debug, Error)]
pub enum PulseError {
    /// The companion process is not running or its endpoint is unrecoverable
    #[error("Antigravity not found")]
    DiscoveryNotFound,

    /// The quota request failed even after re-discovery
    #[error("Fetch failed")]
    FetchFailed(#[source] FetchError),

    /// A refresh was attempted before any successful discovery
    #[error("No connection")]
    NoCredential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            PulseError::DiscoveryNotFound.to_string(),
            "Antigravity not found"
        );
        assert_eq!(
            PulseError::FetchFailed(FetchError::Status(500)).to_string(),
            "Fetch failed"
        );
        assert_eq!(PulseError::NoCredential.to_string(), "No connection");
    }

    #[test]
    fn test_fetch_error_from_json() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let fetch: FetchError = err.into();
        assert!(matches!(fetch, FetchError::Decode(_)));
    }
}
