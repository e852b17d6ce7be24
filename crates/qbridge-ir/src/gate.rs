//! Quantum gate types.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Standard gates with known semantics.
///
/// Angles are concrete radians; OpenQASM 2 has no symbolic parameters
/// once a program has been lowered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate (`u1` in qelib1).
    P(f64),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(f64, f64, f64),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around X.
    CRx(f64),
    /// Controlled rotation around Y.
    CRy(f64),
    /// Controlled rotation around Z.
    CRz(f64),
    /// Controlled phase gate (`cu1` in qelib1).
    CP(f64),
    /// Controlled U(θ, φ, λ) (`cu3` in qelib1).
    CU(f64, f64, f64),
    /// XX rotation gate.
    RXX(f64),
    /// ZZ rotation gate.
    RZZ(f64),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

impl StandardGate {
    /// Build a gate from its qelib1 name and parameter list.
    ///
    /// Returns `None` when the name is unknown or the parameter count is wrong.
    pub fn from_qelib(name: &str, params: &[f64]) -> Option<Self> {
        let gate = match (name, params) {
            ("id" | "u0", [] | [_]) => StandardGate::I,
            ("x", []) => StandardGate::X,
            ("y", []) => StandardGate::Y,
            ("z", []) => StandardGate::Z,
            ("h", []) => StandardGate::H,
            ("s", []) => StandardGate::S,
            ("sdg", []) => StandardGate::Sdg,
            ("t", []) => StandardGate::T,
            ("tdg", []) => StandardGate::Tdg,
            ("sx", []) => StandardGate::SX,
            ("sxdg", []) => StandardGate::SXdg,
            ("rx", [t]) => StandardGate::Rx(*t),
            ("ry", [t]) => StandardGate::Ry(*t),
            ("rz", [t]) => StandardGate::Rz(*t),
            ("p" | "u1", [l]) => StandardGate::P(*l),
            ("u2", [p, l]) => StandardGate::U(PI / 2.0, *p, *l),
            ("u3" | "u", [t, p, l]) => StandardGate::U(*t, *p, *l),
            ("cx", []) => StandardGate::CX,
            ("cy", []) => StandardGate::CY,
            ("cz", []) => StandardGate::CZ,
            ("ch", []) => StandardGate::CH,
            ("swap", []) => StandardGate::Swap,
            ("crx", [t]) => StandardGate::CRx(*t),
            ("cry", [t]) => StandardGate::CRy(*t),
            ("crz", [t]) => StandardGate::CRz(*t),
            ("cp" | "cu1", [l]) => StandardGate::CP(*l),
            ("cu3", [t, p, l]) => StandardGate::CU(*t, *p, *l),
            ("rxx", [t]) => StandardGate::RXX(*t),
            ("rzz", [t]) => StandardGate::RZZ(*t),
            ("ccx", []) => StandardGate::CCX,
            ("cswap", []) => StandardGate::CSwap,
            _ => return None,
        };
        Some(gate)
    }

    /// Number of `(params, qubits)` a qelib1 gate expects, if it exists.
    pub fn qelib_signature(name: &str) -> Option<(usize, usize)> {
        let sig = match name {
            "id" | "x" | "y" | "z" | "h" | "s" | "sdg" | "t" | "tdg" | "sx" | "sxdg" => (0, 1),
            "u0" | "rx" | "ry" | "rz" | "p" | "u1" => (1, 1),
            "u2" => (2, 1),
            "u3" | "u" => (3, 1),
            "cx" | "cy" | "cz" | "ch" | "swap" => (0, 2),
            "crx" | "cry" | "crz" | "cp" | "cu1" | "rxx" | "rzz" => (1, 2),
            "cu3" => (3, 2),
            "ccx" | "cswap" => (0, 3),
            _ => return None,
        };
        Some(sig)
    }

    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(..) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CRx(_) => "crx",
            StandardGate::CRy(_) => "cry",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::CU(..) => "cu",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U(..) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::CU(..)
            | StandardGate::RXX(_)
            | StandardGate::RZZ(_) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// Angles carried by this gate, in declaration order.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CRx(p)
            | StandardGate::CRy(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p)
            | StandardGate::RXX(p)
            | StandardGate::RZZ(p) => vec![*p],
            StandardGate::U(a, b, c) | StandardGate::CU(a, b, c) => vec![*a, *b, *c],
            _ => vec![],
        }
    }

    /// Number of leading control qubits.
    pub fn num_controls(&self) -> usize {
        match self {
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::CU(..)
            | StandardGate::CSwap => 1,
            StandardGate::CCX => 2,
            _ => 0,
        }
    }
}

/// Format an angle for display, preferring small multiples of π.
pub fn format_angle(value: f64) -> String {
    if value == 0.0 {
        return "0".into();
    }
    for den in 1..=8_i32 {
        let num = value * f64::from(den) / PI;
        let rounded = num.round();
        if (num - rounded).abs() < 1e-9 && rounded.abs() <= 16.0 {
            // Exact in the checked range.
            #[allow(clippy::cast_possible_truncation)]
            let n = rounded as i32;
            let sign = if n < 0 { "-" } else { "" };
            let n = n.abs();
            return match (n, den) {
                (1, 1) => format!("{sign}π"),
                (_, 1) => format!("{sign}{n}π"),
                (1, _) => format!("{sign}π/{den}"),
                _ => format!("{sign}{n}π/{den}"),
            };
        }
    }
    let text = format!("{value:.4}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_qelib_aliases() {
        assert_eq!(StandardGate::from_qelib("u1", &[0.5]), Some(StandardGate::P(0.5)));
        assert_eq!(
            StandardGate::from_qelib("u2", &[0.1, 0.2]),
            Some(StandardGate::U(PI / 2.0, 0.1, 0.2))
        );
        assert_eq!(StandardGate::from_qelib("cu1", &[1.0]), Some(StandardGate::CP(1.0)));
        assert_eq!(StandardGate::from_qelib("h", &[1.0]), None);
        assert_eq!(StandardGate::from_qelib("foo", &[]), None);
    }

    #[test]
    fn test_signature_matches_constructor() {
        for name in ["h", "rx", "u2", "u3", "cx", "crz", "cu3", "ccx", "cswap"] {
            let (np, nq) = StandardGate::qelib_signature(name).unwrap();
            let gate = StandardGate::from_qelib(name, &vec![0.25; np]).unwrap();
            assert_eq!(gate.num_qubits(), nq, "{name}");
        }
    }

    #[test]
    fn test_num_controls() {
        assert_eq!(StandardGate::CX.num_controls(), 1);
        assert_eq!(StandardGate::CCX.num_controls(), 2);
        assert_eq!(StandardGate::Swap.num_controls(), 0);
        assert_eq!(StandardGate::RZZ(1.0).num_controls(), 0);
    }

    #[test]
    fn test_format_angle() {
        assert_eq!(format_angle(PI), "π");
        assert_eq!(format_angle(PI / 2.0), "π/2");
        assert_eq!(format_angle(-PI / 4.0), "-π/4");
        assert_eq!(format_angle(3.0 * PI / 4.0), "3π/4");
        assert_eq!(format_angle(0.0), "0");
        assert_eq!(format_angle(0.1234), "0.1234");
        assert_eq!(format_angle(0.5), "0.5");
    }
}
