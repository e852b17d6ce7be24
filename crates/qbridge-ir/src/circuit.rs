//! High-level circuit builder API.

use rustc_hash::FxHashMap;
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId, Register};

/// A quantum circuit.
///
/// Qubits and classical bits are grouped into named registers and
/// numbered globally in declaration order. Every instruction is validated
/// against the declared bits when it is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    name: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    qregs: Vec<Register>,
    cregs: Vec<Register>,
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            qregs: vec![],
            cregs: vec![],
            instructions: vec![],
        }
    }

    /// Create a circuit with a `q` register and, if `num_clbits > 0`, a `c` register.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        // Fresh circuit: names cannot collide.
        if num_qubits > 0 {
            let _ = circuit.add_qreg("q", num_qubits);
        }
        if num_clbits > 0 {
            let _ = circuit.add_creg("c", num_clbits);
        }
        circuit
    }

    /// Add a quantum register with multiple qubits.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<QubitId>> {
        let name = name.into();
        if self.qregs.iter().any(|r| r.name == name) {
            return Err(IrError::DuplicateRegister(name));
        }
        let offset = u32::try_from(self.qubits.len())
            .ok()
            .filter(|offset| offset.checked_add(size).is_some())
            .ok_or_else(|| IrError::RegisterTooLarge {
                name: name.clone(),
                size,
            })?;
        let ids: Vec<QubitId> = (0..size).map(|i| QubitId(offset + i)).collect();
        for (index, id) in ids.iter().enumerate() {
            self.qubits.push(Qubit {
                id: *id,
                register: name.clone(),
                index: index as u32,
            });
        }
        self.qregs.push(Register { name, size, offset });
        Ok(ids)
    }

    /// Add a classical register with multiple bits.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<ClbitId>> {
        let name = name.into();
        if self.cregs.iter().any(|r| r.name == name) {
            return Err(IrError::DuplicateRegister(name));
        }
        let offset = u32::try_from(self.clbits.len())
            .ok()
            .filter(|offset| offset.checked_add(size).is_some())
            .ok_or_else(|| IrError::RegisterTooLarge {
                name: name.clone(),
                size,
            })?;
        let ids: Vec<ClbitId> = (0..size).map(|i| ClbitId(offset + i)).collect();
        for (index, id) in ids.iter().enumerate() {
            self.clbits.push(Clbit {
                id: *id,
                register: name.clone(),
                index: index as u32,
            });
        }
        self.cregs.push(Register { name, size, offset });
        Ok(ids)
    }

    /// Append an instruction after validating its operands.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        let context = Some(instruction.name().to_string());
        let mut seen = Vec::with_capacity(instruction.qubits.len());
        for &qubit in &instruction.qubits {
            if qubit.0 as usize >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: context,
                });
            }
            if seen.contains(&qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: context,
                });
            }
            seen.push(qubit);
        }
        for &clbit in &instruction.clbits {
            if clbit.0 as usize >= self.clbits.len() {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: context,
                });
            }
        }
        let expected = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.num_qubits()),
            InstructionKind::Measure | InstructionKind::Reset => Some(1),
            InstructionKind::Barrier => None,
        };
        if let Some(expected) = expected {
            if instruction.qubits.len() != expected {
                return Err(IrError::QubitCountMismatch {
                    gate_name: instruction.name().to_string(),
                    expected,
                    got: instruction.qubits.len(),
                });
            }
        }
        self.instructions.push(instruction);
        Ok(self)
    }

    // =========================================================================
    // Gates
    // =========================================================================

    /// Apply any standard gate.
    pub fn gate(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::H, [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::X, [qubit])
    }

    /// Apply RX gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rx(theta), [qubit])
    }

    /// Apply RZ gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rz(theta), [qubit])
    }

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CX, [control, target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CZ, [control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Swap, [q1, q2])
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CCX, [c1, c2, target])
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::reset(qubit))
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.apply(Instruction::barrier(qubits))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the classical bits in the circuit.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Quantum registers in declaration order.
    pub fn qregs(&self) -> &[Register] {
        &self.qregs
    }

    /// Classical registers in declaration order.
    pub fn cregs(&self) -> &[Register] {
        &self.cregs
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// `reg[index]` label of a qubit.
    pub fn qubit_label(&self, qubit: QubitId) -> String {
        match self.qubits.get(qubit.0 as usize) {
            Some(q) => format!("{}[{}]", q.register, q.index),
            None => qubit.to_string(),
        }
    }

    /// `reg[index]` label of a classical bit.
    pub fn clbit_label(&self, clbit: ClbitId) -> String {
        match self.clbits.get(clbit.0 as usize) {
            Some(c) => format!("{}[{}]", c.register, c.index),
            None => clbit.to_string(),
        }
    }

    /// Circuit depth: the longest chain of operations sharing a bit.
    ///
    /// Barriers do not contribute. Measurements occupy their classical bit.
    pub fn depth(&self) -> usize {
        let mut qubit_level = vec![0usize; self.qubits.len()];
        let mut clbit_level = vec![0usize; self.clbits.len()];
        let mut depth = 0;
        for inst in &self.instructions {
            if inst.is_barrier() {
                continue;
            }
            let level = inst
                .qubits
                .iter()
                .map(|q| qubit_level[q.0 as usize])
                .chain(inst.clbits.iter().map(|c| clbit_level[c.0 as usize]))
                .max()
                .unwrap_or(0)
                + 1;
            for q in &inst.qubits {
                qubit_level[q.0 as usize] = level;
            }
            for c in &inst.clbits {
                clbit_level[c.0 as usize] = level;
            }
            depth = depth.max(level);
        }
        depth
    }

    /// Count operations by name.
    pub fn count_ops(&self) -> FxHashMap<&'static str, usize> {
        let mut counts = FxHashMap::default();
        for inst in &self.instructions {
            *counts.entry(inst.name()).or_insert(0) += 1;
        }
        counts
    }

    /// True when no gate or reset touches a qubit after it has been measured.
    pub fn has_only_terminal_measurements(&self) -> bool {
        let mut measured = vec![false; self.qubits.len()];
        for inst in &self.instructions {
            match inst.kind {
                InstructionKind::Measure => {
                    for q in &inst.qubits {
                        measured[q.0 as usize] = true;
                    }
                }
                InstructionKind::Barrier => {}
                InstructionKind::Gate(_) | InstructionKind::Reset => {
                    if inst.qubits.iter().any(|q| measured[q.0 as usize]) {
                        return false;
                    }
                }
            }
        }
        true
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        let q0 = QubitId(0);
        let q1 = QubitId(1);

        circuit
            .h(q0)?
            .cx(q0, q1)?
            .measure(q0, ClbitId(0))?
            .measure(q1, ClbitId(1))?;

        Ok(circuit)
    }
}

impl fmt::Display for Circuit {
    /// Plain-text listing, one instruction per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "circuit {}: {} qubits, {} clbits",
            self.name,
            self.num_qubits(),
            self.num_clbits()
        )?;
        for inst in &self.instructions {
            f.write_str(&inst.label())?;
            let operands: Vec<String> = inst.qubits.iter().map(|q| self.qubit_label(*q)).collect();
            write!(f, " {}", operands.join(", "))?;
            for c in &inst.clbits {
                write!(f, " -> {}", self.clbit_label(*c))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_clbits(), 0);
    }

    #[test]
    fn test_add_registers() {
        let mut circuit = Circuit::new("test");
        let a = circuit.add_qreg("a", 2).unwrap();
        let b = circuit.add_qreg("b", 3).unwrap();
        circuit.add_creg("m", 4).unwrap();

        assert_eq!(a, vec![QubitId(0), QubitId(1)]);
        assert_eq!(b[0], QubitId(2));
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.num_clbits(), 4);
        assert_eq!(circuit.qubit_label(QubitId(3)), "b[1]");
        assert!(circuit.qregs()[1].contains(4));
    }

    #[test]
    fn test_duplicate_register() {
        let mut circuit = Circuit::new("test");
        circuit.add_qreg("q", 1).unwrap();
        assert!(matches!(
            circuit.add_qreg("q", 2),
            Err(IrError::DuplicateRegister(name)) if name == "q"
        ));
    }

    #[test]
    fn test_bell_state() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.depth(), 3); // H, CX, parallel measures
        assert!(circuit.has_only_terminal_measurements());
        assert_eq!(circuit.count_ops()["measure"], 2);
    }

    #[test]
    fn test_operand_validation() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        assert!(matches!(
            circuit.h(QubitId(2)),
            Err(IrError::QubitNotFound { .. })
        ));
        assert!(matches!(
            circuit.cx(QubitId(1), QubitId(1)),
            Err(IrError::DuplicateQubit { .. })
        ));
        assert!(matches!(
            circuit.measure(QubitId(0), ClbitId(1)),
            Err(IrError::ClbitNotFound { .. })
        ));
        assert!(matches!(
            circuit.gate(StandardGate::CX, [QubitId(0)]),
            Err(IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            })
        ));
        assert!(circuit.instructions().is_empty());
    }

    #[test]
    fn test_depth_ignores_barrier() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit
            .h(QubitId(0))
            .unwrap()
            .barrier([QubitId(0), QubitId(1)])
            .unwrap()
            .rx(PI / 2.0, QubitId(1))
            .unwrap();
        assert_eq!(circuit.depth(), 1);
    }

    #[test]
    fn test_mid_circuit_measurement_detected() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .x(QubitId(0))
            .unwrap();
        assert!(!circuit.has_only_terminal_measurements());
    }

    #[test]
    fn test_display_listing() {
        let circuit = Circuit::bell().unwrap();
        let text = circuit.to_string();
        assert!(text.starts_with("circuit bell: 2 qubits, 2 clbits"));
        assert!(text.contains("h q[0]\n"));
        assert!(text.contains("cx q[0], q[1]\n"));
        assert!(text.contains("measure q[1] -> c[1]\n"));
    }

    #[test]
    fn test_register_offset_overflow_is_rejected() {
        let mut circuit = Circuit::new("wide");
        circuit.add_qreg("a", 1).unwrap();
        let err = circuit.add_qreg("b", u32::MAX).unwrap_err();
        assert!(matches!(err, IrError::RegisterTooLarge { size: u32::MAX, .. }));
        assert_eq!(circuit.num_qubits(), 1);

        circuit.add_creg("c", 2).unwrap();
        assert!(circuit.add_creg("d", u32::MAX - 1).is_err());
    }
}
