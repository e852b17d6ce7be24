//! `OpenQASM` 2.0 parser and emitter for qbridge
//!
//! Parses OpenQASM 2.0 programs into a [`qbridge_ir::Circuit`] and writes
//! circuits back out as OpenQASM 2.0 or 3.0.
//!
//! # Supported Features
//!
//! | Feature | Status | Example |
//! |---------|--------|---------|
//! | Version declaration | ✅ | `OPENQASM 2.0;` |
//! | Standard library | ✅ | `include "qelib1.inc";` |
//! | Registers | ✅ | `qreg q[2];`, `creg c[2];` |
//! | Gates and broadcasting | ✅ | `h q;`, `cx q[0], q[1];` |
//! | Parameter expressions | ✅ | `rz(-pi/4 + sin(0.1)) q[0];` |
//! | Gate definitions | ✅ | `gate bell a, b { h a; cx a, b; }` |
//! | Measure, reset, barrier | ✅ | `measure q -> c;` |
//! | `opaque` gates | declared only | calls are rejected |
//! | `if` | ❌ | rejected as unsupported |
//!
//! # Example: Parsing QASM
//!
//! ```rust
//! use qbridge_qasm::parse;
//!
//! let qasm = r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     qreg q[2];
//!     creg c[2];
//!     h q[0];
//!     cx q[0], q[1];
//!     measure q -> c;
//! "#;
//!
//! let circuit = parse(qasm).unwrap();
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.num_clbits(), 2);
//! ```
//!
//! # Example: Error text
//!
//! ```rust
//! use qbridge_qasm::parse;
//!
//! let err = parse("OPENQASM 2.0;\nqreg q[1];\nh q[0];").unwrap_err();
//! assert_eq!(err.to_string(), "unregistered gate 'h'");
//! ```

pub mod ast;
mod emitter;
mod error;
mod lexer;
mod parser;

pub use emitter::{emit_qasm2, emit_qasm3};
pub use error::{ParseError, ParseResult};
pub use parser::{DEFAULT_MAX_WIRES, parse, parse_ast, parse_with_limit};
