//! Function dispatch and response normalization.
//!
//! This crate sits between the transports in `qbridge-server` and the
//! providers behind the `qbridge-hal` traits. It routes a generic
//! [`FunctionCall`] to one of four operations and returns either a natural
//! result or an [`ExecutionOutcome`], whichever execution path ran.
//!
//! | Module | Operation |
//! |--------|-----------|
//! | [`builder`] | fixed Bell circuit with its canned diagram |
//! | [`compiler`] | header normalization and parser error classification |
//! | [`enumerator`] | local and remote backend listing |
//! | [`coordinator`] | local or remote execution with fallback, timeout and session cleanup |
//! | [`dispatch`] | routing and parameter handling |
//!
//! # Example
//!
//! ```ignore
//! use qbridge_core::{Capabilities, Coordinator, Dispatcher, FunctionCall};
//!
//! let dispatcher = Dispatcher::new(Coordinator::new(Capabilities::none()));
//! let call = FunctionCall::new("list_backends", Default::default());
//! let response = dispatcher.dispatch(&call).await?;
//! ```

pub mod builder;
pub mod capability;
pub mod compiler;
pub mod coordinator;
pub mod dispatch;
pub mod enumerator;
pub mod error;
pub mod outcome;

#[cfg(test)]
mod testing;

pub use builder::{BELL_DIAGRAM, CircuitDescription, bell_circuit, describe_bell, render_drawing};
pub use capability::{Capabilities, CapabilityFlags};
pub use compiler::{QASM_HEADER, classify_parse_error, compile, compile_with_limit, normalize_source};
pub use coordinator::{
    Coordinator, DEFAULT_BACKEND, DEFAULT_MAX_WIRES, DEFAULT_REMOTE_TIMEOUT, DEFAULT_SHOTS,
    DRAWING_UNAVAILABLE, FALLBACK_BACKEND, is_local, quasi_to_counts,
};
pub use dispatch::{
    DispatchResponse, Dispatcher, FunctionCall, MISSING_SOURCE_DRAWING, Operation,
};
pub use enumerator::{BackendCatalog, NO_ACCOUNT, list_backends};
pub use error::{CompileError, CompileResult, DispatchError, DispatchResult};
pub use outcome::ExecutionOutcome;
