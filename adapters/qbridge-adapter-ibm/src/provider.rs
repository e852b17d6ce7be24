//! Cloud provider and runtime session backed by [`IbmClient`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use qbridge_hal::{
    AccountInfo, CloudProvider, CredentialStore, HalResult, QuasiDistribution, RuntimeService,
    RuntimeSession,
};
use qbridge_ir::Circuit;

use crate::api::{DEFAULT_ENDPOINT, IbmClient, JobResultResponse};
use crate::error::{IbmError, IbmResult};

/// Channel reported in [`AccountInfo`].
pub const CHANNEL: &str = "ibm_quantum_platform";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// IBM Quantum provider.
///
/// Credentials are resolved from the [`CredentialStore`] on every call.
#[derive(Debug, Clone)]
pub struct IbmProvider {
    endpoint: String,
    credentials: CredentialStore,
    poll_interval: Duration,
}

impl IbmProvider {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn client(&self) -> HalResult<IbmClient> {
        let creds = self.credentials.require()?;
        Ok(IbmClient::new(&self.endpoint, creds.token())?)
    }
}

#[async_trait]
impl CloudProvider for IbmProvider {
    async fn backends(&self) -> HalResult<Vec<String>> {
        let names = self.client()?.list_backends().await?;
        debug!(count = names.len(), "listed IBM backends");
        Ok(names)
    }

    async fn active_account(&self) -> HalResult<AccountInfo> {
        let user = self.client()?.current_user().await?;
        let mut account = AccountInfo::new(CHANNEL);
        if let Some(email) = user.email {
            account = account.with_email(email);
        }
        if let Some(instance) = user.instances.into_iter().next() {
            account = account.with_instance(instance.name);
        }
        Ok(account)
    }
}

#[async_trait]
impl RuntimeService for IbmProvider {
    #[instrument(skip(self))]
    async fn open_session(&self, backend: &str) -> HalResult<Box<dyn RuntimeSession>> {
        let client = Arc::new(self.client()?);
        let session = client.create_session(backend).await?;
        info!(session = %session.id, "opened IBM runtime session");
        Ok(Box::new(IbmSession {
            client,
            id: session.id,
            backend: backend.to_string(),
            poll_interval: self.poll_interval,
            closed: AtomicBool::new(false),
        }))
    }
}

/// A sampler session on one IBM backend.
#[derive(Debug)]
pub struct IbmSession {
    client: Arc<IbmClient>,
    id: String,
    backend: String,
    poll_interval: Duration,
    closed: AtomicBool,
}

impl IbmSession {
    async fn wait_for_job(&self, job_id: &str) -> IbmResult<()> {
        loop {
            let status = self.client.get_job_status(job_id).await?;
            if status.is_completed() {
                return Ok(());
            }
            if status.is_failed() {
                return Err(IbmError::JobFailed(status.failure_reason()));
            }
            if status.is_cancelled() {
                return Err(IbmError::JobCancelled(job_id.to_string()));
            }
            debug!(job = %job_id, status = %status.status, "job pending");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl RuntimeSession for IbmSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn backend(&self) -> &str {
        &self.backend
    }

    #[instrument(skip(self, circuit), fields(session = %self.id))]
    async fn sample(&self, circuit: &Circuit, shots: u32) -> HalResult<QuasiDistribution> {
        let qasm = qbridge_qasm::emit_qasm3(circuit);
        let job = self
            .client
            .submit_sampler_job(&self.backend, &self.id, &qasm, shots)
            .await?;
        info!(job = %job.id, "submitted sampler job");

        self.wait_for_job(&job.id).await?;
        let results = self.client.get_job_results(&job.id).await?;
        Ok(to_quasi_distribution(&results)?)
    }

    async fn close(&self) -> HalResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match self.client.close_session(&self.id).await {
            Ok(()) => {
                info!(session = %self.id, "closed IBM runtime session");
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.id, "failed to close session: {e}");
                Err(e.into())
            }
        }
    }
}

/// Extract a quasi-distribution from either result format.
///
/// V1 results carry `quasi_dists` keyed by decimal or hex outcome; V2
/// results carry per-shot hex samples, which become frequencies.
pub fn to_quasi_distribution(results: &JobResultResponse) -> IbmResult<QuasiDistribution> {
    if let Some(dist) = results.quasi_dists.as_ref().and_then(|d| d.first()) {
        return dist
            .iter()
            .map(|(key, &p)| parse_outcome(key).map(|k| (k, p)))
            .collect::<IbmResult<QuasiDistribution>>();
    }

    let first = results
        .results
        .first()
        .ok_or_else(|| IbmError::MalformedResult("no results".into()))?;
    let register = first
        .data
        .get("c")
        .or_else(|| first.data.values().next())
        .ok_or_else(|| IbmError::MalformedResult("no classical register data".into()))?;
    if register.samples.is_empty() {
        return Err(IbmError::MalformedResult("no samples".into()));
    }

    let weight = 1.0 / register.samples.len() as f64;
    register
        .samples
        .iter()
        .map(|s| parse_outcome(s).map(|k| (k, weight)))
        .collect()
}

fn parse_outcome(key: &str) -> IbmResult<u64> {
    let parsed = match key.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => key.parse(),
    };
    parsed.map_err(|_| IbmError::MalformedResult(format!("invalid outcome '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(json: &str) -> JobResultResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_v1_quasi_dists() {
        let dist = to_quasi_distribution(&results(
            r#"{"quasi_dists": [{"0": 0.5, "0x3": 0.49, "1": 0.01}]}"#,
        ))
        .unwrap();
        let pairs: Vec<_> = dist.iter().collect();
        assert_eq!(pairs, vec![(0, 0.5), (1, 0.01), (3, 0.49)]);
    }

    #[test]
    fn test_v2_samples_become_frequencies() {
        let dist = to_quasi_distribution(&results(
            r#"{"results": [{"data": {"c": {"samples": ["0x0", "0x3", "0x3", "0x0"]}}}]}"#,
        ))
        .unwrap();
        let pairs: Vec<_> = dist.iter().collect();
        assert_eq!(pairs, vec![(0, 0.5), (3, 0.5)]);
    }

    #[test]
    fn test_empty_results_rejected() {
        assert!(to_quasi_distribution(&results(r#"{"results": []}"#)).is_err());
        assert!(to_quasi_distribution(&results(r#"{"quasi_dists": [{"zz": 1.0}]}"#)).is_err());
    }

    #[test]
    fn test_missing_credentials_is_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(Some(dir.path().join("none.json")))
            .with_env_vars(Vec::<String>::new());
        let provider = IbmProvider::new(store);
        assert!(matches!(
            provider.client(),
            Err(qbridge_hal::HalError::AuthenticationFailed(_))
        ));
    }
}
