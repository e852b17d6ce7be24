//! qbridge circuit representation
//!
//! A deliberately small circuit model: registers of qubits and classical
//! bits plus an ordered instruction list. It is what the QASM parser lowers
//! into, what the simulator executes and what the diagram renderer draws.
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qbridge_ir::{Circuit, ClbitId, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit.measure(QubitId(1), ClbitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! assert!(circuit.draw().contains("┤ H ├"));
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `id`, `x`, `y`, `z`, `h` | 1 | Identity, Pauli and Hadamard gates |
//! | `s`, `sdg`, `t`, `tdg`, `sx`, `sxdg` | 1 | Clifford+T and sqrt(X) gates |
//! | `rx`, `ry`, `rz`, `p`, `u` | 1 | Rotations, phase and the universal `U(θ,φ,λ)` |
//! | `cx`, `cy`, `cz`, `ch`, `swap` | 2 | Controlled Paulis, controlled-H and SWAP |
//! | `crx`, `cry`, `crz`, `cp`, `cu` | 2 | Controlled rotations |
//! | `rxx`, `rzz` | 2 | Ising interactions |
//! | `ccx`, `cswap` | 3 | Toffoli and Fredkin gates |

pub mod circuit;
pub mod draw;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId, Register};
