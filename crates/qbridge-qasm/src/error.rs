//! Error types for the QASM parser.
//!
//! The `Display` wording of the first three variants is stable: callers
//! classify failures by matching on it.

use thiserror::Error;

/// Errors that can occur during parsing and lowering.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Malformed source text.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A gate was called that is neither built in, included nor defined.
    #[error("unregistered gate '{0}'")]
    UnregisteredGate(String),

    /// A register or gate argument was used before declaration.
    #[error("'{0}' is not defined")]
    NotDefined(String),

    /// Wrong number of parameters.
    #[error("gate '{gate}' takes {expected} parameters, got {got}")]
    WrongParameterCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Wrong number of qubit arguments.
    #[error("gate '{gate}' acts on {expected} qubits, got {got}")]
    WrongQubitCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Index out of bounds.
    #[error("index {index} out of range for register '{register}' of size {size}")]
    IndexOutOfRange {
        register: String,
        index: u32,
        size: u32,
    },

    /// A register of the wrong kind was used as an operand.
    #[error("'{name}' is not a {expected} register")]
    RegisterKind {
        name: String,
        expected: &'static str,
    },

    /// Broadcast over registers of different sizes.
    #[error("register sizes do not match in '{0}'")]
    SizeMismatch(String),

    /// Duplicate declaration.
    #[error("'{0}' is already declared")]
    DuplicateDeclaration(String),

    /// A declaration would take the circuit past its wire limit.
    #[error("register '{register}' of size {size} exceeds the limit of {limit} bits")]
    RegisterTooLarge {
        register: String,
        size: u32,
        limit: u32,
    },

    /// Include of a file other than the standard library.
    #[error("cannot find include file '{0}'")]
    IncludeNotFound(String),

    /// Construct the lowering does not support.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// IR error during circuit construction.
    #[error("circuit error: {0}")]
    Circuit(#[from] qbridge_ir::IrError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
