//! Backend listing across local and remote capabilities.

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::capability::Capabilities;

/// Account status when no remote provider is configured.
pub const NO_ACCOUNT: &str = "No IBMQ account configured";

/// Prefix applied to local simulator names in listings.
pub const LOCAL_PREFIX: &str = "aer_";

/// Result of listing backends. Built fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCatalog {
    pub backends: Vec<String>,
    pub active_account: String,
}

/// List every reachable backend.
///
/// Never fails: each failure becomes a descriptive entry in `backends` or
/// in `active_account`.
#[instrument(skip(caps))]
pub async fn list_backends(caps: &Capabilities) -> BackendCatalog {
    let mut backends = Vec::new();
    let mut active_account = NO_ACCOUNT.to_string();

    match caps.local() {
        Some(local) => match local.backends() {
            Ok(names) => backends.extend(names.into_iter().map(|n| format!("{LOCAL_PREFIX}{n}"))),
            Err(e) => {
                warn!("local backend listing failed: {e}");
                backends.push(format!("Error getting Aer backends: {e}"));
            }
        },
        None => backends.push(
            "No Aer simulators available - enable the local simulator backend".to_string(),
        ),
    }

    match caps.cloud() {
        Some(cloud) => {
            // Names are kept even when the account lookup fails afterwards.
            let remote = async {
                let names = cloud.backends().await?;
                debug!(count = names.len(), "remote backends listed");
                backends.extend(names);
                cloud.active_account().await
            };
            active_account = match std::panic::AssertUnwindSafe(remote).catch_unwind().await {
                Ok(Ok(account)) => format!("IBM Quantum account: {account}"),
                Ok(Err(e)) => format!("IBM Quantum error: {e}"),
                Err(payload) => format!(
                    "IBM Quantum error: {}",
                    crate::compiler::panic_message(payload.as_ref())
                ),
            };
        }
        None => active_account.push_str(" (IBM Quantum provider not enabled)"),
    }

    BackendCatalog {
        backends,
        active_account,
    }
}
