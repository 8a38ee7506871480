//! State values published by the polling controller.

use serde::Serialize;

use crate::quota::QuotaSnapshot;

/// What the display surface should show. Exactly one is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum DisplayState {
    /// Discovery or fetch in progress, no result yet
    #[default]
    Loading,
    /// The last cycle failed; carries a short user-facing message
    Error(String),
    /// The last cycle produced this snapshot
    Ready(QuotaSnapshot),
}

impl DisplayState {
    /// Check if this is the error state
    pub fn is_error(&self) -> bool {
        matches!(self, DisplayState::Error(_))
    }
}

/// Whether the controller currently holds a discovered endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// Not discovered yet, or the last discovery failed
    NoCredential,
    /// An endpoint and token are known (they may still be stale)
    Credentialed,
}
