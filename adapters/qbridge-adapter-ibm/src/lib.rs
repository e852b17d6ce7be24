//! qbridge IBM Quantum adapter
//!
//! Implements the remote capabilities of `qbridge-hal` against the IBM
//! Quantum Runtime REST API:
//!
//! - [`IbmProvider`] as [`CloudProvider`](qbridge_hal::CloudProvider):
//!   backend listing and account identity
//! - [`IbmProvider`] as [`RuntimeService`](qbridge_hal::RuntimeService):
//!   sessions running the sampler primitive
//!
//! Circuits are submitted as OpenQASM 3 with `include "stdgates.inc";`.
//! Results come back as quasi-distributions over integer outcomes.
//!
//! # Authentication
//!
//! | Source | Key |
//! |--------|-----|
//! | Environment | `QBRIDGE_IBM_TOKEN`, `IBM_QUANTUM_TOKEN` |
//! | Account file | `~/.qiskit/config.json` → `ibm_token` |
//!
//! # Example
//!
//! ```ignore
//! use qbridge_adapter_ibm::IbmProvider;
//! use qbridge_hal::{CloudProvider, CredentialStore, RuntimeService};
//!
//! let provider = IbmProvider::new(CredentialStore::default());
//! println!("{:?}", provider.backends().await?);
//!
//! let session = provider.open_session("ibm_torino").await?;
//! let dist = session.sample(&circuit, 1024).await;
//! session.close().await?;
//! ```

mod api;
mod error;
mod provider;

pub use api::{DEFAULT_ENDPOINT, IbmClient};
pub use error::{IbmError, IbmResult};
pub use provider::{CHANNEL, IbmProvider, IbmSession, to_quasi_distribution};
