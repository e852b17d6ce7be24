//! IBM Quantum Runtime REST client.
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`IbmClient::list_backends`] | `GET /v1/backends` |
//! | [`IbmClient::current_user`] | `GET /v1/users/me` |
//! | [`IbmClient::create_session`] | `POST /v1/sessions` |
//! | [`IbmClient::close_session`] | `DELETE /v1/sessions/{id}/close` |
//! | [`IbmClient::submit_sampler_job`] | `POST /v1/jobs` |
//! | [`IbmClient::get_job_status`] | `GET /v1/jobs/{id}` |
//! | [`IbmClient::get_job_results`] | `GET /v1/jobs/{id}/results` |

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::error::{IbmError, IbmResult};

/// Default IBM Quantum Platform API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// IBM API version header value.
const IBM_API_VERSION: &str = "2025-05-01";

const USER_AGENT: &str = concat!("qbridge/", env!("CARGO_PKG_VERSION"));

/// IBM Quantum API client bound to one token.
pub struct IbmClient {
    client: Client,
    endpoint: String,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl IbmClient {
    /// Create a client sending `token` as a bearer credential.
    pub fn new(endpoint: impl Into<String>, token: &str) -> IbmResult<Self> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| IbmError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::HeaderName::from_static("ibm-api-version"),
            header::HeaderValue::from_static(IBM_API_VERSION),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    /// Names of the backends visible to this account.
    pub async fn list_backends(&self) -> IbmResult<Vec<String>> {
        let response = self.client.get(self.url("/v1/backends")).send().await?;
        let listing: BackendsResponse = check(response, "list backends").await?.json().await?;
        Ok(listing.names())
    }

    /// Account identity.
    pub async fn current_user(&self) -> IbmResult<UserResponse> {
        let response = self.client.get(self.url("/v1/users/me")).send().await?;
        Ok(check(response, "read account").await?.json().await?)
    }

    /// Open a session on `backend`.
    pub async fn create_session(&self, backend: &str) -> IbmResult<SessionResponse> {
        let body = SessionRequest {
            backend,
            mode: "dedicated",
        };
        let response = self
            .client
            .post(self.url("/v1/sessions"))
            .json(&body)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::BackendUnavailable(backend.to_string()));
        }
        Ok(check(response, "open session").await?.json().await?)
    }

    /// Close a session. Already-closed sessions are not an error.
    pub async fn close_session(&self, session_id: &str) -> IbmResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/sessions/{session_id}/close")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND || response.status() == StatusCode::CONFLICT
        {
            return Ok(());
        }
        check(response, "close session").await?;
        Ok(())
    }

    /// Submit an OpenQASM 3 circuit to the sampler primitive inside a session.
    pub async fn submit_sampler_job(
        &self,
        backend: &str,
        session_id: &str,
        qasm: &str,
        shots: u32,
    ) -> IbmResult<SubmitResponse> {
        let body = serde_json::json!({
            "program_id": "sampler",
            "backend": backend,
            "session_id": session_id,
            "params": {
                "version": 2,
                "pubs": [[qasm, {}, shots]],
                "options": { "optimization_level": 1 }
            }
        });
        let response = self
            .client
            .post(self.url("/v1/jobs"))
            .json(&body)
            .send()
            .await?;
        Ok(check(response, "job submission").await?.json().await?)
    }

    pub async fn get_job_status(&self, job_id: &str) -> IbmResult<JobStatusResponse> {
        let response = self
            .client
            .get(self.url(&format!("/v1/jobs/{job_id}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::JobNotFound(job_id.to_string()));
        }
        Ok(check(response, "job status").await?.json().await?)
    }

    pub async fn get_job_results(&self, job_id: &str) -> IbmResult<JobResultResponse> {
        let response = self
            .client
            .get(self.url(&format!("/v1/jobs/{job_id}/results")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::JobNotFound(job_id.to_string()));
        }
        Ok(check(response, "job results").await?.json().await?)
    }
}

/// Turn non-success responses into errors carrying the body text.
async fn check(response: Response, action: &str) -> IbmResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "no body".to_string());
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .ok()
        .and_then(ApiErrorResponse::message)
        .unwrap_or(body);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(IbmError::Unauthorized(format!("{action}: {message}")));
    }
    Err(IbmError::Api {
        status: status.as_u16(),
        message: format!("{action} failed: {message}"),
    })
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    backend: &'a str,
    mode: &'a str,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    message: String,
}

impl ApiErrorResponse {
    fn message(self) -> Option<String> {
        self.message
            .or_else(|| self.errors.into_iter().next().map(|e| e.message))
    }
}

/// Backend listing; the platform API returns `devices`, older deployments
/// return `backends`, either as objects or as bare names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BackendsResponse {
    Devices { devices: Vec<BackendEntry> },
    Backends { backends: Vec<BackendEntry> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BackendEntry {
    Name(String),
    Object { name: String },
}

impl BackendsResponse {
    fn names(self) -> Vec<String> {
        let entries = match self {
            BackendsResponse::Devices { devices } => devices,
            BackendsResponse::Backends { backends } => backends,
        };
        entries
            .into_iter()
            .map(|e| match e {
                BackendEntry::Name(name) | BackendEntry::Object { name } => name,
            })
            .collect()
    }
}

/// Account identity from `/v1/users/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub instances: Vec<InstanceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceEntry {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    pub id: String,
    /// Top-level status, mixed case on the platform API.
    pub status: String,
    #[serde(default)]
    pub state: Option<JobState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    #[serde(default)]
    pub reason: Option<String>,
}

impl JobStatusResponse {
    fn normalized(&self) -> String {
        self.status.to_uppercase()
    }

    pub fn is_completed(&self) -> bool {
        self.normalized() == "COMPLETED"
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.normalized().as_str(), "FAILED" | "ERROR")
    }

    pub fn is_cancelled(&self) -> bool {
        self.normalized() == "CANCELLED"
    }

    pub fn is_terminal(&self) -> bool {
        self.is_completed() || self.is_failed() || self.is_cancelled()
    }

    pub fn failure_reason(&self) -> String {
        self.state
            .as_ref()
            .and_then(|s| s.reason.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// Job result response.
#[derive(Debug, Deserialize)]
pub struct JobResultResponse {
    #[serde(default)]
    pub results: Vec<SamplerResult>,
    /// V1 sampler: one quasi-distribution per circuit.
    #[serde(default)]
    pub quasi_dists: Option<Vec<HashMap<String, f64>>>,
}

/// V2 sampler result for one PUB.
#[derive(Debug, Deserialize)]
pub struct SamplerResult {
    /// Classical register name to per-shot samples.
    #[serde(default)]
    pub data: HashMap<String, RegisterSamples>,
}

/// Per-shot samples as hex strings (`"0x3"`).
#[derive(Debug, Deserialize)]
pub struct RegisterSamples {
    pub samples: Vec<String>,
}
