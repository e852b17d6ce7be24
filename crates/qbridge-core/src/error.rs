//! Error types for the core crate.

use thiserror::Error;

/// Circuit source could not be turned into a circuit.
///
/// The message is already user-facing: it names the problem and how to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CompileError {
    #[error("{0}")]
    InvalidCircuitSource(String),
}

/// Failure escalated to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The function name matched no operation.
    #[error("Unknown function: {0}")]
    Routing(String),

    /// A required parameter was missing or malformed.
    #[error("{0}")]
    Input(String),

    /// The delegated operation failed.
    #[error("{0}")]
    Execution(String),
}

pub type CompileResult<T> = Result<T, CompileError>;
pub type DispatchResult<T> = Result<T, DispatchError>;
