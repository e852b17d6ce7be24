//! Dispatch router: `(name, parameters)` calls onto core operations.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;

use futures::FutureExt;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::builder::{CircuitDescription, describe_bell};
use crate::capability::Capabilities;
use crate::compiler::{compile_with_limit, panic_message};
use crate::coordinator::{Coordinator, DEFAULT_BACKEND, DEFAULT_SHOTS};
use crate::enumerator::{BackendCatalog, list_backends};
use crate::error::{DispatchError, DispatchResult};
use crate::outcome::ExecutionOutcome;

/// Drawing attached when execute is called without source.
pub const MISSING_SOURCE_DRAWING: &str = "Error: Could not generate circuit drawing";

/// A generic function call as received by either transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parameters: Map<String, Value>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(de: D) -> Result<Map<String, Value>, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(de)?.unwrap_or_default())
}

/// The fixed set of operations a call can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListBackends,
    CreateBellCircuit,
    CreateCustomCircuit,
    ExecuteCircuit,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::ListBackends,
        Operation::CreateBellCircuit,
        Operation::CreateCustomCircuit,
        Operation::ExecuteCircuit,
    ];

    /// Identifier used by the tool-invocation surface.
    pub fn tool_name(self) -> &'static str {
        match self {
            Operation::ListBackends => "list_backends",
            Operation::CreateBellCircuit => "create_bell_circuit",
            Operation::CreateCustomCircuit => "create_custom_circuit",
            Operation::ExecuteCircuit => "execute_circuit",
        }
    }

    /// Name listed in the HTTP manifest.
    pub fn display_name(self) -> &'static str {
        match self {
            Operation::ListBackends => "List available backends",
            Operation::CreateBellCircuit => "Create a bell quantum circuit",
            Operation::CreateCustomCircuit => "Create a custom quantum circuit",
            Operation::ExecuteCircuit => "Execute quantum circuit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::ListBackends => {
                "Lists all available quantum backends that the user has access to"
            }
            Operation::CreateBellCircuit => {
                "Creates a quantum circuit that prepares a Bell state (entangled state)"
            }
            Operation::CreateCustomCircuit => {
                "Creates a custom quantum circuit based on OpenQASM 2.0 code"
            }
            Operation::ExecuteCircuit => {
                "Executes a quantum circuit on a backend and returns the results"
            }
        }
    }
}

impl FromStr for Operation {
    type Err = DispatchError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.tool_name() == name || op.display_name() == name)
            .ok_or_else(|| DispatchError::Routing(name.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// Natural result of whichever operation handled a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DispatchResponse {
    Catalog(BackendCatalog),
    Circuit(CircuitDescription),
    Outcome(ExecutionOutcome),
}

/// Routes function calls. Holds no per-call state.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    coordinator: Coordinator,
    default_backend: String,
}

impl Dispatcher {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            default_backend: DEFAULT_BACKEND.to_string(),
        }
    }

    pub fn with_default_backend(mut self, backend: impl Into<String>) -> Self {
        self.default_backend = backend.into();
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.coordinator.capabilities()
    }

    pub fn default_backend(&self) -> &str {
        &self.default_backend
    }

    /// Route a call.
    ///
    /// `Err` means the failure must be escalated to the transport. Execution
    /// failures are not escalated: they come back as an error outcome.
    #[instrument(skip(self, call), fields(function = %call.name))]
    pub async fn dispatch(&self, call: &FunctionCall) -> DispatchResult<DispatchResponse> {
        let operation: Operation = call.name.parse()?;
        info!(%operation, "dispatching");
        match operation {
            Operation::ListBackends => self.list_backends().await.map(DispatchResponse::Catalog),
            Operation::CreateBellCircuit => {
                self.create_bell_circuit().map(DispatchResponse::Circuit)
            }
            Operation::CreateCustomCircuit => self
                .create_custom_circuit(call.parameters.get("instructions"))
                .map(DispatchResponse::Circuit),
            Operation::ExecuteCircuit => Ok(DispatchResponse::Outcome(
                self.execute_circuit(&call.parameters).await,
            )),
        }
    }

    pub async fn list_backends(&self) -> DispatchResult<BackendCatalog> {
        AssertUnwindSafe(list_backends(self.capabilities()))
            .catch_unwind()
            .await
            .map_err(|payload| {
                DispatchError::Execution(format!(
                    "Error listing backends: {}",
                    panic_message(payload.as_ref())
                ))
            })
    }

    pub fn create_bell_circuit(&self) -> DispatchResult<CircuitDescription> {
        describe_bell()
            .map_err(|e| DispatchError::Execution(format!("Error creating Bell circuit: {e}")))
    }

    pub fn create_custom_circuit(
        &self,
        instructions: Option<&Value>,
    ) -> DispatchResult<CircuitDescription> {
        let Some(source) = instructions
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        else {
            return Err(DispatchError::Input(
                "Error creating custom circuit: Instructions parameter is required".into(),
            ));
        };
        let circuit = compile_with_limit(source, self.coordinator.max_wires())
            .map_err(|e| DispatchError::Execution(format!("Error creating custom circuit: {e}")))?;
        Ok(CircuitDescription::of(&circuit))
    }

    /// Execute with parameters `qasm_code`, `shots` and `backend_name`.
    ///
    /// The tool surface names the backend parameter `backend`; both are read.
    pub async fn execute_circuit(&self, parameters: &Map<String, Value>) -> ExecutionOutcome {
        let backend = parameters
            .get("backend_name")
            .or_else(|| parameters.get("backend"))
            .and_then(Value::as_str)
            .unwrap_or(self.default_backend.as_str());

        let Some(source) = parameters
            .get("qasm_code")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        else {
            return ExecutionOutcome::error(
                "Error executing circuit: qasm_code parameter is required",
                MISSING_SOURCE_DRAWING,
                backend,
            );
        };

        let shots = match parse_shots(parameters.get("shots")) {
            Ok(shots) => shots,
            Err(message) => {
                return ExecutionOutcome::error(
                    format!("Error executing circuit: {message}"),
                    MISSING_SOURCE_DRAWING,
                    backend,
                );
            }
        };

        self.coordinator.execute(source, shots, backend).await
    }
}

/// Shot count from a JSON integer or numeric string; absent means the default.
fn parse_shots(value: Option<&Value>) -> Result<u32, String> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_SHOTS),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            let shown = value.map_or_else(String::new, Value::to_string);
            format!("shots must be a positive integer, got {shown}")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLocal;
    use serde_json::json;
    use std::sync::Arc;

    fn dispatcher() -> Dispatcher {
        let caps = Capabilities::none().with_local(Arc::new(MockLocal::working()));
        Dispatcher::new(Coordinator::new(caps))
    }

    fn call(name: &str, parameters: Value) -> FunctionCall {
        serde_json::from_value(json!({"name": name, "parameters": parameters})).unwrap()
    }

    #[test]
    fn test_operation_names() {
        for op in Operation::ALL {
            assert_eq!(op.tool_name().parse::<Operation>().unwrap(), op);
            assert_eq!(op.display_name().parse::<Operation>().unwrap(), op);
        }
        assert_eq!(
            "frobnicate".parse::<Operation>().unwrap_err().to_string(),
            "Unknown function: frobnicate"
        );
    }

    #[test]
    fn test_null_parameters_accepted() {
        let call: FunctionCall =
            serde_json::from_value(json!({"name": "list_backends", "parameters": null})).unwrap();
        assert!(call.parameters.is_empty());
        let call: FunctionCall = serde_json::from_value(json!({"name": "list_backends"})).unwrap();
        assert!(call.parameters.is_empty());
    }

    #[test]
    fn test_parse_shots() {
        assert_eq!(parse_shots(None), Ok(DEFAULT_SHOTS));
        assert_eq!(parse_shots(Some(&json!(null))), Ok(DEFAULT_SHOTS));
        assert_eq!(parse_shots(Some(&json!(100))), Ok(100));
        assert_eq!(parse_shots(Some(&json!("256"))), Ok(256));
        assert!(parse_shots(Some(&json!(0))).unwrap_err().contains("shots"));
        assert!(parse_shots(Some(&json!(-5))).is_err());
        assert!(parse_shots(Some(&json!("many"))).is_err());
        assert!(parse_shots(Some(&json!(1.5))).is_err());
    }

    #[tokio::test]
    async fn test_unknown_function_escalates() {
        let err = dispatcher()
            .dispatch(&call("frobnicate", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Routing(_)));
        assert!(err.to_string().contains("frobnicate"));
    }

    #[tokio::test]
    async fn test_bell_uses_canned_diagram() {
        let response = dispatcher()
            .dispatch(&call("Create a bell quantum circuit", json!({})))
            .await
            .unwrap();
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["circuit_drawing"], crate::builder::BELL_DIAGRAM);
        assert!(value.get("num_qubits").is_none());
    }

    #[tokio::test]
    async fn test_custom_circuit() {
        let response = dispatcher()
            .dispatch(&call(
                "create_custom_circuit",
                json!({"instructions": "qreg q[3];\ncreg c[3];\nh q[0];"}),
            ))
            .await
            .unwrap();
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["num_qubits"], 3);
        assert_eq!(value["num_clbits"], 3);
    }

    #[tokio::test]
    async fn test_custom_circuit_missing_instructions() {
        let err = dispatcher()
            .dispatch(&call("create_custom_circuit", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Input(_)));
        assert_eq!(
            err.to_string(),
            "Error creating custom circuit: Instructions parameter is required"
        );
    }

    #[tokio::test]
    async fn test_custom_circuit_parse_error_escalates() {
        let err = dispatcher()
            .dispatch(&call(
                "create_custom_circuit",
                json!({"instructions": "qreg q[1];\nh r[0];"}),
            ))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error creating custom circuit: 'r' is not defined. \
             Make sure all registers are declared before use."
        );
    }

    #[tokio::test]
    async fn test_execute_missing_source_is_an_outcome() {
        let response = dispatcher()
            .dispatch(&call("execute_circuit", json!({"shots": 10})))
            .await
            .unwrap();
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(
            value["message"],
            "Error executing circuit: qasm_code parameter is required"
        );
        assert_eq!(value["circuit_drawing"], MISSING_SOURCE_DRAWING);
        assert_eq!(value["backend_name"], "aer_simulator");
        assert!(value["counts"].is_null());
    }

    #[tokio::test]
    async fn test_execute_bad_shots_is_an_outcome() {
        let outcome = dispatcher()
            .execute_circuit(
                json!({"qasm_code": "qreg q[1];", "shots": "lots", "backend_name": "aer_simulator"})
                    .as_object()
                    .unwrap(),
            )
            .await;
        assert!(outcome.message().unwrap().contains("shots must be a positive integer"));
    }

    #[tokio::test]
    async fn test_execute_accepts_tool_backend_key() {
        let outcome = dispatcher()
            .execute_circuit(json!({"backend": "ibm_fez"}).as_object().unwrap())
            .await;
        assert_eq!(outcome.backend_name(), "ibm_fez");
    }

    #[tokio::test]
    async fn test_execute_uses_defaults() {
        let source = "qreg q[1];\ncreg c[1];\nmeasure q[0] -> c[0];";
        let outcome = dispatcher()
            .with_default_backend("qasm_simulator")
            .execute_circuit(json!({"qasm_code": source}).as_object().unwrap())
            .await;
        assert!(outcome.is_success());
        assert_eq!(outcome.backend_name(), "qasm_simulator");
        assert_eq!(outcome.counts().unwrap().total(), u64::from(DEFAULT_SHOTS));
    }

    #[tokio::test]
    async fn test_empty_source_counts_as_missing() {
        let err = dispatcher()
            .create_custom_circuit(Some(&json!("")))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Input(_)));

        let outcome = dispatcher()
            .execute_circuit(json!({"qasm_code": ""}).as_object().unwrap())
            .await;
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.message(),
            Some("Error executing circuit: qasm_code parameter is required")
        );
        assert_eq!(outcome.circuit_drawing(), MISSING_SOURCE_DRAWING);
    }

    #[tokio::test]
    async fn test_oversized_register_is_rejected_before_allocation() {
        let dispatcher = Dispatcher::new(
            Coordinator::new(Capabilities::none().with_local(Arc::new(MockLocal::working())))
                .with_max_wires(8),
        );
        let err = dispatcher
            .create_custom_circuit(Some(&json!("qreg q[2000000];")))
            .unwrap_err();
        match err {
            DispatchError::Execution(message) => assert_eq!(
                message,
                "Error creating custom circuit: Error in QASM code: \
                 register 'q' of size 2000000 exceeds the limit of 8 bits"
            ),
            other => panic!("unexpected error: {other:?}"),
        }

        let outcome = dispatcher
            .execute_circuit(json!({"qasm_code": "qreg q[9];"}).as_object().unwrap())
            .await;
        assert!(!outcome.is_success());
        assert!(outcome.message().unwrap().contains("exceeds the limit of 8 bits"));
        assert_eq!(outcome.circuit_drawing(), crate::coordinator::DRAWING_UNAVAILABLE);
    }
}
