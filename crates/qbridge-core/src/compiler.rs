//! Circuit source to [`Circuit`], with user-facing error messages.
//!
//! Parser messages are classified by substring, case-insensitively, in this
//! order:
//!
//! | Parser message contains | Reported as |
//! |-------------------------|-------------|
//! | `syntax error` | `QASM syntax error at line N. Please check your QASM code.` |
//! | `unregistered` and `gate` | `Unregistered gate 'g'. Make sure to include 'qelib1.inc' ...` |
//! | `not defined` | `'x' is not defined. Make sure all registers are declared ...` |
//! | anything else | `Error in QASM code: <parser message>` |
//!
//! The matching is best-effort and tracks the wording of `qbridge-qasm`'s
//! `ParseError`.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use qbridge_ir::Circuit;

use crate::error::{CompileError, CompileResult};

/// Header prepended to sources that do not declare a version.
pub const QASM_HEADER: &str = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\n\n";

/// Prepend [`QASM_HEADER`] unless the source already starts with `OPENQASM`.
pub fn normalize_source(source: &str) -> Cow<'_, str> {
    if source.trim().starts_with("OPENQASM") {
        Cow::Borrowed(source)
    } else {
        Cow::Owned(format!("{QASM_HEADER}{source}"))
    }
}

/// Parse circuit source, accepting bare gate sequences.
pub fn compile(source: &str) -> CompileResult<Circuit> {
    compile_with_limit(source, qbridge_qasm::DEFAULT_MAX_WIRES)
}

/// [`compile`] with a cap on declared qubits (and classical bits).
pub fn compile_with_limit(source: &str, max_wires: u32) -> CompileResult<Circuit> {
    let normalized = normalize_source(source);
    match panic::catch_unwind(AssertUnwindSafe(|| {
        qbridge_qasm::parse_with_limit(&normalized, max_wires)
    })) {
        Ok(Ok(circuit)) => Ok(circuit),
        Ok(Err(e)) => Err(CompileError::InvalidCircuitSource(classify_parse_error(
            &e.to_string(),
        ))),
        Err(payload) => Err(CompileError::InvalidCircuitSource(format!(
            "Error processing QASM code: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

/// Map a parser message onto the user-facing taxonomy.
pub fn classify_parse_error(message: &str) -> String {
    let lower = message.to_lowercase();
    if lower.contains("syntax error") {
        match line_locator(&lower) {
            Some(line) => format!("QASM syntax error at line {line}. Please check your QASM code."),
            None => "QASM syntax error. Please check your QASM code.".to_string(),
        }
    } else if lower.contains("unregistered") && lower.contains("gate") {
        let gate = first_quoted(message).unwrap_or("gate");
        format!("Unregistered gate '{gate}'. Make sure to include 'qelib1.inc' for standard gates.")
    } else if lower.contains("not defined") {
        let item = first_quoted(message).unwrap_or("item");
        format!("'{item}' is not defined. Make sure all registers are declared before use.")
    } else {
        format!("Error in QASM code: {message}")
    }
}

/// The number following the last `line` in a message.
fn line_locator(message: &str) -> Option<&str> {
    let (_, rest) = message.rsplit_once("line")?;
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// Text between the first pair of single quotes.
fn first_quoted(message: &str) -> Option<&str> {
    let mut parts = message.split('\'');
    parts.next()?;
    let quoted = parts.next()?;
    parts.next().map(|_| quoted)
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal error".to_string()
    }
}
