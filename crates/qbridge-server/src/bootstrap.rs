//! Capability acquisition at startup.
//!
//! Providers are built once from the configuration and never re-probed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use qbridge_adapter_ibm::IbmProvider;
use qbridge_adapter_sim::SimulatorProvider;
use qbridge_core::{Capabilities, Coordinator, Dispatcher};
use qbridge_hal::{CredentialStore, TokenState, default_account_path};

use crate::config::{BackendsConfig, Config};

/// Credential store for the configured account file and token.
pub fn credential_store(config: &BackendsConfig) -> CredentialStore {
    let path = config.credentials_path.clone().or_else(default_account_path);
    CredentialStore::new(path).with_token(config.ibm_token.clone())
}

/// Build the provider handles enabled in `config`.
pub fn build_capabilities(config: &BackendsConfig) -> Capabilities {
    let mut caps = Capabilities::none();

    if config.simulator_enabled {
        let provider = SimulatorProvider::new().with_max_qubits(config.simulator_max_qubits);
        caps = caps.with_local(Arc::new(provider));
    }

    if config.ibm_enabled {
        let provider = Arc::new(
            IbmProvider::new(credential_store(config)).with_endpoint(config.ibm_endpoint.clone()),
        );
        caps = caps.with_cloud(provider.clone()).with_runtime(provider);
    }

    caps
}

/// Build the dispatcher for a loaded configuration.
pub fn build_dispatcher(config: &Config) -> Dispatcher {
    let caps = build_capabilities(&config.backends);
    let coordinator = Coordinator::new(caps)
        .with_remote_timeout(Duration::from_secs(config.execution.remote_timeout_secs))
        .with_max_wires(config.execution.max_wires);
    Dispatcher::new(coordinator).with_default_backend(config.execution.default_backend.clone())
}

/// Log the token status and capability flags.
pub async fn log_startup(config: &Config, dispatcher: &Dispatcher) {
    let status = credential_store(&config.backends).load_token();
    match status.status {
        TokenState::Success => info!("IBM Quantum token status: success - {}", status.message),
        TokenState::Warning => warn!("IBM Quantum token status: warning - {}", status.message),
        TokenState::Error => warn!("IBM Quantum token status: error - {}", status.message),
    }

    let flags = dispatcher.capabilities().flags();
    info!(
        local_simulation = flags.local_simulation,
        cloud_provider = flags.cloud_provider,
        runtime_primitives = flags.runtime_primitives,
        "capabilities acquired"
    );

    if !status.is_success() {
        return;
    }
    if let Some(cloud) = dispatcher.capabilities().cloud() {
        match cloud.active_account().await {
            Ok(account) => info!("Connected as {account}"),
            Err(e) => warn!("IBM Quantum account check failed: {e}"),
        }
    }
}
