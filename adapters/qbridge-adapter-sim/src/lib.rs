//! qbridge local statevector simulator
//!
//! Implements the local-simulation capability: a [`SimulatorProvider`]
//! resolving named [`SimulatorBackend`]s that run circuits on an exact
//! statevector and sample measurement counts.
//!
//! # Backends
//!
//! | Listed as | Resolves from | Notes |
//! |-----------|---------------|-------|
//! | `aer_simulator` | `simulator`, `aer_simulator` | default |
//! | `aer_simulator_statevector` | `simulator_statevector` | same engine |
//! | `aer_qasm_simulator` | `qasm_simulator` | legacy alias, fallback target |
//!
//! # Memory
//!
//! | Qubits | Amplitudes |
//! |--------|------------|
//! | 10 | ~16 KB |
//! | 20 | ~16 MB |
//! | 24 | ~256 MB (default limit) |
//!
//! Counts are keyed by classical bitstrings with clbit 0 rightmost.
//!
//! # Example
//!
//! ```ignore
//! use qbridge_adapter_sim::SimulatorProvider;
//! use qbridge_hal::LocalProvider;
//! use qbridge_ir::Circuit;
//!
//! let backend = SimulatorProvider::new().get_backend("aer_simulator")?;
//! let result = backend.run(&Circuit::bell()?, 1024).await?;
//! // roughly half "00", half "11"
//! println!("{:?}", result.counts);
//! ```

mod simulator;
mod statevector;

pub use simulator::{
    DEFAULT_MAX_QUBITS, LOCAL_PREFIX, SIMULATOR_NAMES, SimulatorBackend, SimulatorProvider,
};
