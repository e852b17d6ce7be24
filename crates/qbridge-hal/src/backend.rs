//! Backend, provider and runtime-session traits.
//!
//! Three capability seams sit between the core and the outside world:
//!
//! | Trait | Kind | Implemented by | Used for |
//! |-------|------|----------------|----------|
//! | [`LocalProvider`] | sync lookup | `qbridge-adapter-sim` | listing and resolving local simulators |
//! | [`CloudProvider`] | async | `qbridge-adapter-ibm` | listing remote devices, account identity |
//! | [`RuntimeService`] | async | `qbridge-adapter-ibm` | session-scoped sampler execution |
//!
//! A local [`Backend`] runs a circuit to completion and returns raw counts.
//! A [`RuntimeSession`] returns a [`QuasiDistribution`] instead; converting it
//! to counts is the caller's concern.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use qbridge_ir::Circuit;

use crate::error::HalResult;
use crate::result::{ExecutionResult, QuasiDistribution};

/// An execution target that runs circuits to completion.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name, as reported in execution outcomes.
    fn name(&self) -> &str;

    /// Lower a circuit for this backend.
    ///
    /// Fails with [`HalError::CircuitTooLarge`](crate::HalError::CircuitTooLarge)
    /// when the circuit exceeds what the backend can run.
    fn transpile(&self, circuit: &Circuit) -> HalResult<Circuit> {
        Ok(circuit.clone())
    }

    /// Execute a transpiled circuit and wait for its counts.
    async fn run(&self, circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult>;
}

/// Source of local simulator backends.
pub trait LocalProvider: Send + Sync {
    /// Names of every backend this provider can resolve.
    fn backends(&self) -> HalResult<Vec<String>>;

    /// Resolve a backend by name.
    fn get_backend(&self, name: &str) -> HalResult<Arc<dyn Backend>>;
}

/// Remote cloud provider: device listing and account identity.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Names of the remote backends visible to the current account.
    async fn backends(&self) -> HalResult<Vec<String>>;

    /// Identity of the currently configured account.
    async fn active_account(&self) -> HalResult<AccountInfo>;
}

/// Remote execution primitives, scoped to a session on one backend.
#[async_trait]
pub trait RuntimeService: Send + Sync {
    /// Open a session on the named backend.
    async fn open_session(&self, backend: &str) -> HalResult<Box<dyn RuntimeSession>>;
}

/// An open runtime session. Must be closed by the caller.
#[async_trait]
pub trait RuntimeSession: Send + Sync {
    /// Session identifier.
    fn id(&self) -> &str;

    /// Backend the session is bound to.
    fn backend(&self) -> &str;

    /// Run the sampler primitive and wait for its quasi-distribution.
    async fn sample(&self, circuit: &Circuit, shots: u32) -> HalResult<QuasiDistribution>;

    /// Close the session. Closing twice is not an error.
    async fn close(&self) -> HalResult<()>;
}

/// Identity of a remote account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Service channel, e.g. `ibm_quantum_platform`.
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl AccountInfo {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            email: None,
            instance: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

impl fmt::Display for AccountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.email.as_deref().unwrap_or("unknown"))?;
        write!(f, " (channel: {}", self.channel)?;
        if let Some(instance) = &self.instance {
            write!(f, ", instance: {instance}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Counts;

    struct Fixed;

    #[async_trait]
    impl Backend for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn run(&self, _circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
            let counts = Counts::from_pairs([("0", u64::from(shots))]);
            Ok(ExecutionResult::new(counts, shots))
        }
    }

    #[tokio::test]
    async fn test_default_transpile_is_identity() {
        let backend = Fixed;
        let circuit = Circuit::bell().unwrap();
        let lowered = backend.transpile(&circuit).unwrap();
        assert_eq!(lowered, circuit);

        let result = backend.run(&lowered, 10).await.unwrap();
        assert_eq!(result.counts.get("0"), 10);
    }

    #[test]
    fn test_account_display() {
        let account = AccountInfo::new("ibm_quantum_platform")
            .with_email("ada@example.com")
            .with_instance("open-instance");
        assert_eq!(
            account.to_string(),
            "ada@example.com (channel: ibm_quantum_platform, instance: open-instance)"
        );
        assert_eq!(
            AccountInfo::new("ibm_cloud").to_string(),
            "unknown (channel: ibm_cloud)"
        );
    }
}
