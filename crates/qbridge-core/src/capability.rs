//! Optional provider handles and the flags derived from them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use qbridge_hal::{CloudProvider, LocalProvider, RuntimeService};

/// Which optional capabilities were acquired at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub local_simulation: bool,
    pub cloud_provider: bool,
    pub runtime_primitives: bool,
}

/// Provider handles, fixed for the life of the process.
///
/// A capability is present exactly when its handle is `Some`; nothing
/// re-probes the environment after construction.
#[derive(Clone, Default)]
pub struct Capabilities {
    local: Option<Arc<dyn LocalProvider>>,
    cloud: Option<Arc<dyn CloudProvider>>,
    runtime: Option<Arc<dyn RuntimeService>>,
}

impl Capabilities {
    /// No capabilities at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_local(mut self, provider: Arc<dyn LocalProvider>) -> Self {
        self.local = Some(provider);
        self
    }

    pub fn with_cloud(mut self, provider: Arc<dyn CloudProvider>) -> Self {
        self.cloud = Some(provider);
        self
    }

    pub fn with_runtime(mut self, service: Arc<dyn RuntimeService>) -> Self {
        self.runtime = Some(service);
        self
    }

    pub fn local(&self) -> Option<&Arc<dyn LocalProvider>> {
        self.local.as_ref()
    }

    pub fn cloud(&self) -> Option<&Arc<dyn CloudProvider>> {
        self.cloud.as_ref()
    }

    pub fn runtime(&self) -> Option<&Arc<dyn RuntimeService>> {
        self.runtime.as_ref()
    }

    pub fn flags(&self) -> CapabilityFlags {
        CapabilityFlags {
            local_simulation: self.local.is_some(),
            cloud_provider: self.cloud.is_some(),
            runtime_primitives: self.runtime.is_some(),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capabilities").field(&self.flags()).finish()
    }
}
