//! Failures reported by providers, backends and runtime sessions.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    #[error("Unknown backend '{0}'")]
    BackendNotFound(String),

    /// The backend exists but cannot take work right now (offline, reserved,
    /// or no session could be opened on it).
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// No usable credential, or the service rejected it.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job was cancelled before producing a result")]
    JobCancelled,

    #[error("Request to the quantum service failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed service payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unreadable credential file or a bad endpoint.
    #[error("Invalid provider settings: {0}")]
    Configuration(String),

    /// Carries the job id that never reached a terminal state.
    #[error("Job {0} did not finish in time")]
    Timeout(String),

    #[error("Circuit does not fit the backend: {0}")]
    CircuitTooLarge(String),

    #[error("Shot count rejected: {0}")]
    InvalidShots(String),

    /// Anything a provider reports that fits no other variant.
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type HalResult<T> = Result<T, HalError>;
