//! QASM emitters.
//!
//! `emit_qasm2` targets `qelib1.inc`; `emit_qasm3` targets `stdgates.inc`
//! and adds definitions for the gates that library lacks.

use std::fmt::Write;

use qbridge_ir::{Circuit, Instruction, InstructionKind, StandardGate};

/// Which dialect to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Qasm2,
    Qasm3,
}

/// Serialise a circuit as OpenQASM 2.0.
pub fn emit_qasm2(circuit: &Circuit) -> String {
    emit(circuit, Dialect::Qasm2)
}

/// Serialise a circuit as OpenQASM 3.0.
pub fn emit_qasm3(circuit: &Circuit) -> String {
    emit(circuit, Dialect::Qasm3)
}

/// Definitions prepended in QASM 3 for gates outside `stdgates.inc`.
const QASM3_EXTRA_GATES: &[(&str, &str)] = &[
    ("sxdg", "gate sxdg a { h a; sdg a; h a; }"),
    (
        "rxx",
        "gate rxx(theta) a, b { h a; h b; cx a, b; rz(theta) b; cx a, b; h a; h b; }",
    ),
    ("rzz", "gate rzz(theta) a, b { cx a, b; rz(theta) b; cx a, b; }"),
];

fn emit(circuit: &Circuit, dialect: Dialect) -> String {
    let mut out = String::new();
    match dialect {
        Dialect::Qasm2 => out.push_str("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n"),
        Dialect::Qasm3 => {
            out.push_str("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n");
            let used = circuit.count_ops();
            for (name, definition) in QASM3_EXTRA_GATES {
                if used.contains_key(name) {
                    let _ = writeln!(out, "{definition}");
                }
            }
        }
    }

    for reg in circuit.qregs() {
        let _ = match dialect {
            Dialect::Qasm2 => writeln!(out, "qreg {}[{}];", reg.name, reg.size),
            Dialect::Qasm3 => writeln!(out, "qubit[{}] {};", reg.size, reg.name),
        };
    }
    for reg in circuit.cregs() {
        let _ = match dialect {
            Dialect::Qasm2 => writeln!(out, "creg {}[{}];", reg.name, reg.size),
            Dialect::Qasm3 => writeln!(out, "bit[{}] {};", reg.size, reg.name),
        };
    }

    for inst in circuit.instructions() {
        let _ = writeln!(out, "{}", emit_instruction(circuit, inst, dialect));
    }
    out
}

fn emit_instruction(circuit: &Circuit, inst: &Instruction, dialect: Dialect) -> String {
    let qubits: Vec<String> = inst.qubits.iter().map(|q| circuit.qubit_label(*q)).collect();
    let operands = qubits.join(", ");
    match &inst.kind {
        InstructionKind::Gate(gate) => {
            let (name, params) = gate_spelling(gate, dialect);
            if params.is_empty() {
                format!("{name} {operands};")
            } else {
                let params: Vec<String> = params.iter().map(|p| format!("{p:?}")).collect();
                format!("{name}({}) {operands};", params.join(", "))
            }
        }
        InstructionKind::Measure => {
            let bit = inst
                .clbits
                .first()
                .map(|c| circuit.clbit_label(*c))
                .unwrap_or_default();
            match dialect {
                Dialect::Qasm2 => format!("measure {operands} -> {bit};"),
                Dialect::Qasm3 => format!("{bit} = measure {operands};"),
            }
        }
        InstructionKind::Reset => format!("reset {operands};"),
        InstructionKind::Barrier => format!("barrier {operands};"),
    }
}

/// Library name and parameter list of a gate in the given dialect.
fn gate_spelling(gate: &StandardGate, dialect: Dialect) -> (&'static str, Vec<f64>) {
    match (gate, dialect) {
        (StandardGate::U(a, b, c), Dialect::Qasm2) => ("u3", vec![*a, *b, *c]),
        (StandardGate::U(a, b, c), Dialect::Qasm3) => ("U", vec![*a, *b, *c]),
        (StandardGate::CU(a, b, c), Dialect::Qasm2) => ("cu3", vec![*a, *b, *c]),
        (StandardGate::CU(a, b, c), Dialect::Qasm3) => ("cu", vec![*a, *b, *c, 0.0]),
        _ => (gate.name(), gate.parameters()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_ir::QubitId;

    #[test]
    fn test_emit_bell_qasm2() {
        let circuit = Circuit::bell().unwrap();
        let qasm = emit_qasm2(&circuit);
        assert!(qasm.starts_with("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n"));
        assert!(qasm.contains("qreg q[2];\ncreg c[2];\n"));
        assert!(qasm.contains("h q[0];\ncx q[0], q[1];\n"));
        assert!(qasm.contains("measure q[1] -> c[1];"));
    }

    #[test]
    fn test_emit_bell_qasm3() {
        let circuit = Circuit::bell().unwrap();
        let qasm = emit_qasm3(&circuit);
        assert!(qasm.starts_with("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n"));
        assert!(qasm.contains("qubit[2] q;\nbit[2] c;\n"));
        assert!(qasm.contains("c[0] = measure q[0];"));
        assert!(!qasm.contains("gate "));
    }

    #[test]
    fn test_qasm3_defines_missing_gates() {
        let mut circuit = Circuit::with_size("ising", 2, 0);
        circuit
            .gate(StandardGate::RZZ(0.5), [QubitId(0), QubitId(1)])
            .unwrap();
        let qasm = emit_qasm3(&circuit);
        assert!(qasm.contains("gate rzz(theta) a, b"));
        assert!(qasm.contains("rzz(0.5) q[0], q[1];"));
    }

    #[test]
    fn test_u_spelling() {
        let mut circuit = Circuit::with_size("u", 1, 0);
        circuit
            .gate(StandardGate::U(1.0, -0.25, 2.0), [QubitId(0)])
            .unwrap();
        assert!(emit_qasm2(&circuit).contains("u3(1.0, -0.25, 2.0) q[0];"));
        assert!(emit_qasm3(&circuit).contains("U(1.0, -0.25, 2.0) q[0];"));
    }
}
