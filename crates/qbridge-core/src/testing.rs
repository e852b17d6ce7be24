//! Mock providers for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use qbridge_hal::{
    AccountInfo, Backend, CloudProvider, Counts, ExecutionResult, HalError, HalResult,
    LocalProvider, QuasiDistribution, RuntimeService, RuntimeSession,
};
use qbridge_ir::Circuit;

/// Local backend answering every shot with `"00"`.
pub struct MockBackend {
    name: String,
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
        Ok(ExecutionResult::new(
            Counts::from_pairs([("00", u64::from(shots))]),
            shots,
        ))
    }
}

/// Local provider resolving a fixed set of names.
pub struct MockLocal {
    names: Vec<&'static str>,
    listing_fails: bool,
}

impl MockLocal {
    pub fn working() -> Self {
        Self {
            names: vec!["simulator", "qasm_simulator"],
            listing_fails: false,
        }
    }

    pub fn with_names(names: Vec<&'static str>) -> Self {
        Self {
            names,
            listing_fails: false,
        }
    }

    pub fn broken_listing() -> Self {
        Self {
            names: vec!["simulator"],
            listing_fails: true,
        }
    }
}

impl LocalProvider for MockLocal {
    fn backends(&self) -> HalResult<Vec<String>> {
        if self.listing_fails {
            return Err(HalError::Backend("listing exploded".into()));
        }
        Ok(self.names.iter().map(|n| (*n).to_string()).collect())
    }

    fn get_backend(&self, name: &str) -> HalResult<Arc<dyn Backend>> {
        let bare = name.strip_prefix("aer_").unwrap_or(name);
        if self.names.contains(&bare) {
            Ok(Arc::new(MockBackend {
                name: bare.to_string(),
            }))
        } else {
            Err(HalError::BackendNotFound(name.to_string()))
        }
    }
}

/// Cloud provider with canned answers.
pub struct MockCloud {
    pub fail: bool,
}

#[async_trait]
impl CloudProvider for MockCloud {
    async fn backends(&self) -> HalResult<Vec<String>> {
        if self.fail {
            return Err(HalError::AuthenticationFailed("no saved account".into()));
        }
        Ok(vec!["ibm_fez".into(), "ibm_torino".into()])
    }

    async fn active_account(&self) -> HalResult<AccountInfo> {
        Ok(AccountInfo::new("ibm_quantum_platform").with_email("ada@example.com"))
    }
}

/// Cloud provider that lists backends but cannot resolve the account.
pub struct MockCloudNoAccount;

#[async_trait]
impl CloudProvider for MockCloudNoAccount {
    async fn backends(&self) -> HalResult<Vec<String>> {
        Ok(vec!["ibm_fez".into()])
    }

    async fn active_account(&self) -> HalResult<AccountInfo> {
        Err(HalError::AuthenticationFailed("users/me forbidden".into()))
    }
}

/// How a mock session behaves when sampled.
#[derive(Clone, Copy)]
pub enum SampleBehavior {
    Distribution,
    Fail,
    Hang,
    Panic,
}

/// Runtime service recording how many sessions were opened and closed.
pub struct MockRuntime {
    pub behavior: SampleBehavior,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl MockRuntime {
    pub fn new(behavior: SampleBehavior) -> Self {
        Self {
            behavior,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl RuntimeService for MockRuntime {
    async fn open_session(&self, backend: &str) -> HalResult<Box<dyn RuntimeSession>> {
        if backend == "ibm_missing" {
            return Err(HalError::BackendUnavailable(backend.into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            backend: backend.to_string(),
            behavior: self.behavior,
            closed: self.closed.clone(),
        }))
    }
}

pub struct MockSession {
    backend: String,
    behavior: SampleBehavior,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RuntimeSession for MockSession {
    fn id(&self) -> &str {
        "mock-session"
    }

    fn backend(&self) -> &str {
        &self.backend
    }

    async fn sample(&self, _circuit: &Circuit, _shots: u32) -> HalResult<QuasiDistribution> {
        match self.behavior {
            SampleBehavior::Distribution => {
                Ok([(0, 0.5), (3, 0.375), (1, 0.125), (2, 0.0002)]
                    .into_iter()
                    .collect())
            }
            SampleBehavior::Fail => Err(HalError::JobFailed("device calibration".into())),
            SampleBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(HalError::Timeout("never".into()))
            }
            SampleBehavior::Panic => panic!("sampler crashed"),
        }
    }

    async fn close(&self) -> HalResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
