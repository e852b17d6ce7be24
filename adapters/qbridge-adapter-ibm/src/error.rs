//! Failures of the IBM Quantum REST client, and how they surface as
//! [`HalError`]s.

use qbridge_hal::HalError;
use thiserror::Error;

pub type IbmResult<T> = Result<T, IbmError>;

#[derive(Debug, Error)]
pub enum IbmError {
    /// The token contains bytes that cannot go into an HTTP header.
    #[error("Invalid IBM Quantum API token")]
    InvalidToken,

    #[error("IBM Quantum rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the body the service sent back.
    #[error("IBM Quantum API error: {message}")]
    Api { status: u16, message: String },

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job was cancelled: {0}")]
    JobCancelled(String),

    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The job finished but its results hold no usable distribution.
    #[error("Malformed job result: {0}")]
    MalformedResult(String),
}

impl From<IbmError> for HalError {
    fn from(e: IbmError) -> Self {
        match e {
            IbmError::InvalidToken | IbmError::Unauthorized(_) => {
                HalError::AuthenticationFailed(e.to_string())
            }
            IbmError::JobFailed(msg) => HalError::JobFailed(msg),
            IbmError::JobCancelled(_) => HalError::JobCancelled,
            IbmError::BackendUnavailable(msg) => HalError::BackendUnavailable(msg),
            IbmError::Http(e) => HalError::Network(e),
            IbmError::Json(e) => HalError::Serialization(e),
            IbmError::Api { .. } | IbmError::JobNotFound(_) | IbmError::MalformedResult(_) => {
                HalError::Backend(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_mapping() {
        let cases: [(IbmError, fn(&HalError) -> bool); 7] = [
            (IbmError::InvalidToken, |h| {
                matches!(h, HalError::AuthenticationFailed(_))
            }),
            (IbmError::Unauthorized("401".into()), |h| {
                matches!(h, HalError::AuthenticationFailed(m) if m.contains("401"))
            }),
            (IbmError::JobFailed("boom".into()), |h| {
                matches!(h, HalError::JobFailed(m) if m == "boom")
            }),
            (IbmError::JobCancelled("user".into()), |h| {
                matches!(h, HalError::JobCancelled)
            }),
            (IbmError::BackendUnavailable("ibm_kyoto".into()), |h| {
                matches!(h, HalError::BackendUnavailable(m) if m == "ibm_kyoto")
            }),
            (IbmError::JobNotFound("j1".into()), |h| {
                matches!(h, HalError::Backend(m) if m.contains("j1"))
            }),
            (
                IbmError::Api {
                    status: 500,
                    message: "Something went wrong".into(),
                },
                |h| matches!(h, HalError::Backend(m) if m.contains("Something went wrong")),
            ),
        ];

        for (err, check) in cases {
            let label = err.to_string();
            let hal: HalError = err.into();
            assert!(check(&hal), "{label} mapped to {hal:?}");
        }
    }
}
