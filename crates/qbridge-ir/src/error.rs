//! Circuit construction failures.

use thiserror::Error;

use crate::qubit::{ClbitId, QubitId};

/// Rejected edits to a [`Circuit`](crate::Circuit).
///
/// Operand errors name the offending instruction when one is known, so a
/// message reads `q5 is outside the circuit while applying cx`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    #[error("{qubit} is outside the circuit{}", while_applying(.gate_name.as_deref()))]
    QubitNotFound {
        qubit: QubitId,
        gate_name: Option<String>,
    },

    #[error("{clbit} is outside the circuit{}", while_applying(.gate_name.as_deref()))]
    ClbitNotFound {
        clbit: ClbitId,
        gate_name: Option<String>,
    },

    #[error("'{gate_name}' acts on {expected} qubit(s) but was given {got}")]
    QubitCountMismatch {
        gate_name: String,
        expected: usize,
        got: usize,
    },

    /// The same qubit appears twice in one instruction's operands.
    #[error("{qubit} is used twice{}", while_applying(.gate_name.as_deref()))]
    DuplicateQubit {
        qubit: QubitId,
        gate_name: Option<String>,
    },

    #[error("Register '{0}' is already declared")]
    DuplicateRegister(String),

    /// Wire indices would no longer fit in `u32`.
    #[error("Register '{name}' of size {size} does not fit in the circuit")]
    RegisterTooLarge { name: String, size: u32 },
}

fn while_applying(gate_name: Option<&str>) -> String {
    gate_name.map_or_else(String::new, |name| format!(" while applying {name}"))
}

pub type IrResult<T> = Result<T, IrError>;
