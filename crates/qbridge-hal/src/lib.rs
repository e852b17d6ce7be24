//! qbridge hardware abstraction layer
//!
//! Traits and value types shared by the execution core and the backend
//! adapters. The core never talks to a simulator or a cloud service
//! directly; it holds optional handles to the traits defined here.
//!
//! # Capability seams
//!
//! | Trait | Adapter | Credentials |
//! |-------|---------|-------------|
//! | [`LocalProvider`] / [`Backend`] | `qbridge-adapter-sim` | none |
//! | [`CloudProvider`] | `qbridge-adapter-ibm` | [`CredentialStore`] |
//! | [`RuntimeService`] / [`RuntimeSession`] | `qbridge-adapter-ibm` | [`CredentialStore`] |
//!
//! # Example
//!
//! ```ignore
//! use qbridge_hal::LocalProvider;
//! use qbridge_adapter_sim::SimulatorProvider;
//! use qbridge_ir::Circuit;
//!
//! let provider = SimulatorProvider::new();
//! let backend = provider.get_backend("aer_simulator")?;
//! let circuit = backend.transpile(&Circuit::bell()?)?;
//! let result = backend.run(&circuit, 1024).await?;
//! println!("{:?}", result.counts.most_frequent());
//! ```

pub mod auth;
pub mod backend;
pub mod error;
pub mod result;

pub use auth::{
    CredentialStore, Credentials, TokenSource, TokenState, TokenStatus, default_account_path,
    mask_token,
};
pub use backend::{AccountInfo, Backend, CloudProvider, LocalProvider, RuntimeService, RuntimeSession};
pub use error::{HalError, HalResult};
pub use result::{Counts, ExecutionResult, QuasiDistribution};
