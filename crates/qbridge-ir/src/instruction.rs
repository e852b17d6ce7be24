//! One operation of a circuit together with its operands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gate::{StandardGate, format_angle};
use crate::qubit::{ClbitId, QubitId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    Gate(StandardGate),
    /// Reads exactly one qubit into exactly one classical bit.
    Measure,
    /// Returns the qubit to |0⟩.
    Reset,
    /// Scheduling fence; no effect on the state.
    Barrier,
}

/// An operation applied to circuit-wide qubit and bit indices.
///
/// Only [`InstructionKind::Measure`] carries classical operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub qubits: Vec<QubitId>,
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    fn on_qubits(kind: InstructionKind, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind,
            qubits: qubits.into_iter().collect(),
            clbits: Vec::new(),
        }
    }

    pub fn gate(gate: StandardGate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::on_qubits(InstructionKind::Gate(gate), qubits)
    }

    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    pub fn reset(qubit: QubitId) -> Self {
        Self::on_qubits(InstructionKind::Reset, [qubit])
    }

    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::on_qubits(InstructionKind::Barrier, qubits)
    }

    pub fn is_measure(&self) -> bool {
        self.kind == InstructionKind::Measure
    }

    pub fn is_barrier(&self) -> bool {
        self.kind == InstructionKind::Barrier
    }

    pub fn as_gate(&self) -> Option<&StandardGate> {
        if let InstructionKind::Gate(gate) = &self.kind {
            Some(gate)
        } else {
            None
        }
    }

    /// Lower-case QASM mnemonic.
    pub fn name(&self) -> &'static str {
        match &self.kind {
            InstructionKind::Gate(gate) => gate.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
        }
    }

    /// Mnemonic with its angles, e.g. `rx(π/2)`.
    pub fn label(&self) -> String {
        let angles: Vec<String> = self
            .as_gate()
            .map(StandardGate::parameters)
            .unwrap_or_default()
            .into_iter()
            .map(format_angle)
            .collect();
        if angles.is_empty() {
            self.name().to_string()
        } else {
            format!("{}({})", self.name(), angles.join(","))
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands: Vec<String> = self.qubits.iter().map(|q| format!("q[{}]", q.0)).collect();
        write!(f, "{} {}", self.label(), operands.join(", "))?;
        if let [clbit] = self.clbits.as_slice() {
            write!(f, " -> c[{}]", clbit.0)?;
        }
        Ok(())
    }
}
