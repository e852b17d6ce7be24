//! Abstract Syntax Tree for `OpenQASM` 2.0.

use serde::{Deserialize, Serialize};

/// A complete QASM2 program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Declared version (e.g., "2.0"), if the header was present.
    pub version: Option<String>,
    /// Statements in the program.
    pub statements: Vec<Statement>,
}

/// A statement in a QASM2 program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// `include "file";`
    Include(String),

    /// `qreg name[size];`
    QReg { name: String, size: u32 },

    /// `creg name[size];`
    CReg { name: String, size: u32 },

    /// Gate application.
    Gate(GateCall),

    /// `measure q -> c;`
    Measure { qubit: Argument, bit: Argument },

    /// `reset q;`
    Reset(Argument),

    /// `barrier a, b[0];`
    Barrier(Vec<Argument>),

    /// `gate name(params) args { body }`
    GateDef(GateDef),

    /// `opaque name(params) args;`
    Opaque {
        name: String,
        params: Vec<String>,
        qubits: Vec<String>,
    },

    /// `if (creg == value) op;`
    If {
        register: String,
        value: u64,
        body: Box<Statement>,
    },
}

/// A user-defined gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDef {
    pub name: String,
    /// Formal angle parameters.
    pub params: Vec<String>,
    /// Formal qubit arguments.
    pub qubits: Vec<String>,
    pub body: Vec<GateBodyOp>,
}

/// An operation inside a gate body; operands are formal argument names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GateBodyOp {
    Call(GateCall),
    Barrier(Vec<Argument>),
}

/// A gate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name.
    pub name: String,
    /// Gate parameters (angles).
    pub params: Vec<Expression>,
    /// Qubit arguments.
    pub args: Vec<Argument>,
}

/// `name` (whole register) or `name[index]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub register: String,
    pub index: Option<u32>,
}

impl Argument {
    pub fn register(name: impl Into<String>) -> Self {
        Self {
            register: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: u32) -> Self {
        Self {
            register: name.into(),
            index: Some(index),
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Numeric literal.
    Number(f64),
    /// The constant pi.
    Pi,
    /// Formal parameter of an enclosing gate definition.
    Identifier(String),
    /// Unary negation.
    Neg(Box<Expression>),
    /// Binary operation.
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    /// Unary built-in function.
    Call {
        function: Function,
        arg: Box<Expression>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Unary functions allowed in parameter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "exp" => Some(Function::Exp),
            "ln" => Some(Function::Ln),
            "sqrt" => Some(Function::Sqrt),
            _ => None,
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Sqrt => x.sqrt(),
        }
    }
}
