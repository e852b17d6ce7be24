//! Lowering from the QASM2 AST to a `Circuit`.

use std::rc::Rc;

use qbridge_ir::{Circuit, ClbitId, IrError, QubitId, Register, StandardGate};
use rustc_hash::FxHashMap;

use crate::ast::{Argument, BinOp, Expression, GateBodyOp, GateCall, GateDef, Program, Statement};
use crate::error::{ParseError, ParseResult};

/// Gates provided by `include "qelib1.inc";`.
const QELIB1_GATES: &[&str] = &[
    "u3", "u2", "u1", "u0", "u", "p", "cx", "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg",
    "sx", "sxdg", "rx", "ry", "rz", "cz", "cy", "ch", "swap", "ccx", "cswap", "crx", "cry",
    "crz", "cu1", "cp", "cu3", "rxx", "rzz",
];

const STANDARD_INCLUDE: &str = "qelib1.inc";

/// A gate visible at some point in the program.
#[derive(Debug, Clone)]
enum GateEntry {
    /// `U(θ,φ,λ)`, always available.
    BuiltinU,
    /// `CX`, always available.
    BuiltinCX,
    /// A qelib1 gate with its `(params, qubits)` signature.
    Library(usize, usize),
    Defined(Rc<GateDef>),
    Opaque(usize, usize),
}

impl GateEntry {
    fn signature(&self) -> (usize, usize) {
        match self {
            GateEntry::BuiltinU => (3, 1),
            GateEntry::BuiltinCX => (0, 2),
            GateEntry::Library(p, q) | GateEntry::Opaque(p, q) => (*p, *q),
            GateEntry::Defined(def) => (def.params.len(), def.qubits.len()),
        }
    }
}

/// Lower a parsed program to a circuit.
pub fn lower_to_circuit(program: &Program, max_wires: u32) -> ParseResult<Circuit> {
    let mut lowering = Lowering::new(max_wires);
    for statement in &program.statements {
        lowering.lower_statement(statement)?;
    }
    Ok(lowering.circuit)
}

struct Lowering {
    circuit: Circuit,
    gates: FxHashMap<String, GateEntry>,
    max_wires: u32,
}

impl Lowering {
    fn new(max_wires: u32) -> Self {
        let mut gates = FxHashMap::default();
        gates.insert("U".to_string(), GateEntry::BuiltinU);
        gates.insert("CX".to_string(), GateEntry::BuiltinCX);
        Self {
            circuit: Circuit::new("circuit"),
            gates,
            max_wires,
        }
    }

    fn check_wire_budget(&self, name: &str, size: u32, declared: usize) -> ParseResult<()> {
        let total = u64::from(size) + declared as u64;
        if total > u64::from(self.max_wires) {
            return Err(ParseError::RegisterTooLarge {
                register: name.to_string(),
                size,
                limit: self.max_wires,
            });
        }
        Ok(())
    }

    fn lower_statement(&mut self, statement: &Statement) -> ParseResult<()> {
        match statement {
            Statement::Include(path) => self.include(path),
            Statement::QReg { name, size } => {
                self.check_register_name(name)?;
                self.check_wire_budget(name, *size, self.circuit.num_qubits())?;
                self.circuit.add_qreg(name.as_str(), *size)?;
                Ok(())
            }
            Statement::CReg { name, size } => {
                self.check_register_name(name)?;
                self.check_wire_budget(name, *size, self.circuit.num_clbits())?;
                self.circuit.add_creg(name.as_str(), *size)?;
                Ok(())
            }
            Statement::GateDef(def) => self.define_gate(def),
            Statement::Opaque {
                name,
                params,
                qubits,
            } => {
                self.check_gate_name(name)?;
                self.gates.insert(
                    name.clone(),
                    GateEntry::Opaque(params.len(), qubits.len()),
                );
                Ok(())
            }
            Statement::Gate(call) => self.lower_call(call),
            Statement::Measure { qubit, bit } => {
                let (q_whole, qubits) = self.resolve_qubits(qubit)?;
                let (c_whole, clbits) = self.resolve_clbits(bit)?;
                if q_whole != c_whole || qubits.len() != clbits.len() {
                    return Err(ParseError::SizeMismatch("measure".into()));
                }
                for (q, c) in qubits.into_iter().zip(clbits) {
                    self.circuit.measure(q, c)?;
                }
                Ok(())
            }
            Statement::Reset(arg) => {
                let (_, qubits) = self.resolve_qubits(arg)?;
                for q in qubits {
                    self.circuit.reset(q)?;
                }
                Ok(())
            }
            Statement::Barrier(args) => {
                let mut qubits: Vec<QubitId> = vec![];
                for arg in args {
                    for q in self.resolve_qubits(arg)?.1 {
                        if !qubits.contains(&q) {
                            qubits.push(q);
                        }
                    }
                }
                self.circuit.barrier(qubits)?;
                Ok(())
            }
            Statement::If { .. } => Err(ParseError::Unsupported(
                "classically conditioned operations ('if')".into(),
            )),
        }
    }

    fn include(&mut self, path: &str) -> ParseResult<()> {
        if path != STANDARD_INCLUDE {
            return Err(ParseError::IncludeNotFound(path.to_string()));
        }
        for name in QELIB1_GATES {
            if let Some((params, qubits)) = StandardGate::qelib_signature(name) {
                self.gates
                    .entry((*name).to_string())
                    .or_insert(GateEntry::Library(params, qubits));
            }
        }
        Ok(())
    }

    fn check_register_name(&self, name: &str) -> ParseResult<()> {
        let taken = self
            .circuit
            .qregs()
            .iter()
            .chain(self.circuit.cregs())
            .any(|r| r.name == name);
        if taken {
            return Err(ParseError::DuplicateDeclaration(name.to_string()));
        }
        Ok(())
    }

    fn check_gate_name(&self, name: &str) -> ParseResult<()> {
        if self.gates.contains_key(name) {
            return Err(ParseError::DuplicateDeclaration(name.to_string()));
        }
        Ok(())
    }

    /// Register a gate definition after checking its body against the gates
    /// visible so far, which also rules out recursion.
    fn define_gate(&mut self, def: &GateDef) -> ParseResult<()> {
        self.check_gate_name(&def.name)?;
        let dummy_env: FxHashMap<String, f64> =
            def.params.iter().map(|p| (p.clone(), 0.0)).collect();
        for op in &def.body {
            let args = match op {
                GateBodyOp::Call(call) => {
                    let entry = self
                        .gates
                        .get(&call.name)
                        .ok_or_else(|| ParseError::UnregisteredGate(call.name.clone()))?;
                    check_arity(&call.name, entry, call.params.len(), call.args.len())?;
                    for param in &call.params {
                        eval(param, &dummy_env)?;
                    }
                    &call.args
                }
                GateBodyOp::Barrier(args) => args,
            };
            for arg in args {
                if !def.qubits.contains(&arg.register) {
                    return Err(ParseError::NotDefined(arg.register.clone()));
                }
            }
        }
        self.gates
            .insert(def.name.clone(), GateEntry::Defined(Rc::new(def.clone())));
        Ok(())
    }

    /// Lower a top-level call, broadcasting over whole-register arguments.
    fn lower_call(&mut self, call: &GateCall) -> ParseResult<()> {
        let env = FxHashMap::default();
        let params = call
            .params
            .iter()
            .map(|p| eval(p, &env))
            .collect::<ParseResult<Vec<f64>>>()?;
        let resolved = call
            .args
            .iter()
            .map(|a| self.resolve_qubits(a))
            .collect::<ParseResult<Vec<_>>>()?;

        let mut width = None;
        for (whole, qubits) in &resolved {
            if *whole {
                match width {
                    None => width = Some(qubits.len()),
                    Some(w) if w != qubits.len() => {
                        return Err(ParseError::SizeMismatch(call.name.clone()));
                    }
                    Some(_) => {}
                }
            }
        }

        for slot in 0..width.unwrap_or(1) {
            let qubits: Vec<QubitId> = resolved
                .iter()
                .map(|(whole, qs)| if *whole { qs[slot] } else { qs[0] })
                .collect();
            self.apply_gate(&call.name, &params, &qubits)?;
        }
        Ok(())
    }

    /// Apply one gate instance to concrete qubits, expanding definitions.
    fn apply_gate(&mut self, name: &str, params: &[f64], qubits: &[QubitId]) -> ParseResult<()> {
        let entry = self
            .gates
            .get(name)
            .cloned()
            .ok_or_else(|| ParseError::UnregisteredGate(name.to_string()))?;
        check_arity(name, &entry, params.len(), qubits.len())?;
        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: *q,
                    gate_name: Some(name.to_string()),
                }
                .into());
            }
        }

        match entry {
            GateEntry::BuiltinU => {
                self.circuit
                    .gate(StandardGate::U(params[0], params[1], params[2]), qubits.to_vec())?;
            }
            GateEntry::BuiltinCX => {
                self.circuit.gate(StandardGate::CX, qubits.to_vec())?;
            }
            GateEntry::Library(..) => {
                let gate = StandardGate::from_qelib(name, params)
                    .ok_or_else(|| ParseError::UnregisteredGate(name.to_string()))?;
                self.circuit.gate(gate, qubits.to_vec())?;
            }
            GateEntry::Defined(def) => {
                let env: FxHashMap<String, f64> = def
                    .params
                    .iter()
                    .cloned()
                    .zip(params.iter().copied())
                    .collect();
                let binding: FxHashMap<&str, QubitId> = def
                    .qubits
                    .iter()
                    .map(String::as_str)
                    .zip(qubits.iter().copied())
                    .collect();
                let bind = |args: &[Argument]| -> ParseResult<Vec<QubitId>> {
                    args.iter()
                        .map(|a| {
                            binding
                                .get(a.register.as_str())
                                .copied()
                                .ok_or_else(|| ParseError::NotDefined(a.register.clone()))
                        })
                        .collect()
                };
                for op in &def.body {
                    match op {
                        GateBodyOp::Call(call) => {
                            let values = call
                                .params
                                .iter()
                                .map(|p| eval(p, &env))
                                .collect::<ParseResult<Vec<f64>>>()?;
                            let operands = bind(&call.args)?;
                            self.apply_gate(&call.name, &values, &operands)?;
                        }
                        GateBodyOp::Barrier(args) => {
                            let operands = bind(args)?;
                            self.circuit.barrier(operands)?;
                        }
                    }
                }
            }
            GateEntry::Opaque(..) => {
                return Err(ParseError::Unsupported(format!(
                    "opaque gate '{name}' has no definition"
                )));
            }
        }
        Ok(())
    }

    /// Qubits named by an argument; the flag is true for a whole register.
    fn resolve_qubits(&self, arg: &Argument) -> ParseResult<(bool, Vec<QubitId>)> {
        let Some(reg) = find(self.circuit.qregs(), &arg.register) else {
            return Err(self.missing_register(arg, "quantum"));
        };
        let (whole, ids) = select(reg, arg)?;
        Ok((whole, ids.into_iter().map(QubitId).collect()))
    }

    /// Classical bits named by an argument.
    fn resolve_clbits(&self, arg: &Argument) -> ParseResult<(bool, Vec<ClbitId>)> {
        let Some(reg) = find(self.circuit.cregs(), &arg.register) else {
            return Err(self.missing_register(arg, "classical"));
        };
        let (whole, ids) = select(reg, arg)?;
        Ok((whole, ids.into_iter().map(ClbitId).collect()))
    }

    fn missing_register(&self, arg: &Argument, expected: &'static str) -> ParseError {
        let declared = self
            .circuit
            .qregs()
            .iter()
            .chain(self.circuit.cregs())
            .any(|r| r.name == arg.register);
        if declared {
            ParseError::RegisterKind {
                name: arg.register.clone(),
                expected,
            }
        } else {
            ParseError::NotDefined(arg.register.clone())
        }
    }
}

fn find<'a>(registers: &'a [Register], name: &str) -> Option<&'a Register> {
    registers.iter().find(|r| r.name == name)
}

/// Flat bit ids selected by `arg` within `reg`.
fn select(reg: &Register, arg: &Argument) -> ParseResult<(bool, Vec<u32>)> {
    match arg.index {
        Some(index) if index >= reg.size => Err(ParseError::IndexOutOfRange {
            register: reg.name.clone(),
            index,
            size: reg.size,
        }),
        Some(index) => Ok((false, vec![reg.offset + index])),
        None => Ok((true, (reg.offset..reg.offset + reg.size).collect())),
    }
}

fn check_arity(name: &str, entry: &GateEntry, params: usize, qubits: usize) -> ParseResult<()> {
    let (expected_params, expected_qubits) = entry.signature();
    if params != expected_params {
        return Err(ParseError::WrongParameterCount {
            gate: name.to_string(),
            expected: expected_params,
            got: params,
        });
    }
    if qubits != expected_qubits {
        return Err(ParseError::WrongQubitCount {
            gate: name.to_string(),
            expected: expected_qubits,
            got: qubits,
        });
    }
    Ok(())
}

/// Evaluate a parameter expression.
fn eval(expr: &Expression, env: &FxHashMap<String, f64>) -> ParseResult<f64> {
    Ok(match expr {
        Expression::Number(v) => *v,
        Expression::Pi => std::f64::consts::PI,
        Expression::Identifier(name) => *env
            .get(name)
            .ok_or_else(|| ParseError::NotDefined(name.clone()))?,
        Expression::Neg(inner) => -eval(inner, env)?,
        Expression::BinOp { left, op, right } => {
            let (l, r) = (eval(left, env)?, eval(right, env)?);
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => l.powf(r),
            }
        }
        Expression::Call { function, arg } => function.apply(eval(arg, env)?),
    })
}
