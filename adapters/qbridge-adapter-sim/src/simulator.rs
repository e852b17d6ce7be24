//! Simulator backend and provider.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use qbridge_hal::{Backend, Counts, ExecutionResult, HalError, HalResult, LocalProvider};
use qbridge_ir::{Circuit, InstructionKind};

use crate::statevector::{Statevector, sample_index};

/// Prefix under which local simulators are listed.
pub const LOCAL_PREFIX: &str = "aer_";

/// Simulators this provider can resolve, by bare name.
pub const SIMULATOR_NAMES: [&str; 3] = ["simulator", "simulator_statevector", "qasm_simulator"];

/// Default qubit limit; a 24-qubit state is 256 MiB of amplitudes.
pub const DEFAULT_MAX_QUBITS: u32 = 24;

/// Local statevector simulator backend.
#[derive(Debug, Clone)]
pub struct SimulatorBackend {
    name: String,
    max_qubits: u32,
    seed: Option<u64>,
}

impl SimulatorBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_qubits: DEFAULT_MAX_QUBITS,
            seed: None,
        }
    }

    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Fix the RNG seed; every run then draws the same samples.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn max_qubits(&self) -> u32 {
        self.max_qubits
    }

    fn check_size(&self, circuit: &Circuit) -> HalResult<()> {
        if circuit.num_qubits() > self.max_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.max_qubits
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn transpile(&self, circuit: &Circuit) -> HalResult<Circuit> {
        self.check_size(circuit)?;
        Ok(circuit.clone())
    }

    #[instrument(skip(self, circuit), fields(backend = %self.name))]
    async fn run(&self, circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
        self.check_size(circuit)?;
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be positive".into()));
        }

        let start = Instant::now();
        let circuit = circuit.clone();
        let seed = self.seed;
        let counts = tokio::task::spawn_blocking(move || simulate(&circuit, shots, seed))
            .await
            .map_err(|e| HalError::Backend(format!("simulation task failed: {e}")))??;

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        Ok(ExecutionResult::new(counts, shots)
            .with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)))
    }
}

/// Run `shots` repetitions of a circuit and tally the classical registers.
///
/// When no gate or reset follows a measurement the state is evolved once
/// and sampled; otherwise every shot is simulated with collapse.
fn simulate(circuit: &Circuit, shots: u32, seed: Option<u64>) -> HalResult<Counts> {
    let measurements: Vec<(usize, usize)> = circuit
        .instructions()
        .iter()
        .filter(|inst| inst.is_measure())
        .map(|inst| (inst.qubits[0].0 as usize, inst.clbits[0].0 as usize))
        .collect();
    if measurements.is_empty() {
        return Err(HalError::JobFailed(
            "No counts for experiment: circuit has no measurements".into(),
        ));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let num_qubits = circuit.num_qubits();
    let num_clbits = circuit.num_clbits();
    let has_reset = circuit
        .instructions()
        .iter()
        .any(|inst| matches!(inst.kind, InstructionKind::Reset));

    debug!(
        "Starting simulation: {} qubits, {} clbits, {} shots",
        num_qubits, num_clbits, shots
    );

    let mut counts = Counts::new();

    if circuit.has_only_terminal_measurements() && !has_reset {
        let mut sv = Statevector::new(num_qubits);
        for inst in circuit.instructions() {
            sv.apply(inst);
        }
        let cumulative = sv.cumulative_probabilities();

        let mut histogram: BTreeMap<usize, u64> = BTreeMap::new();
        for _ in 0..shots {
            *histogram.entry(sample_index(&cumulative, &mut rng)).or_default() += 1;
        }

        for (index, count) in histogram {
            let mut bits = vec![false; num_clbits];
            for &(qubit, clbit) in &measurements {
                bits[clbit] = (index >> qubit) & 1 == 1;
            }
            counts.insert(bitstring(&bits), count);
        }
    } else {
        debug!("Mid-circuit measurement or reset; simulating shot by shot");
        for _ in 0..shots {
            let mut sv = Statevector::new(num_qubits);
            let mut bits = vec![false; num_clbits];
            for inst in circuit.instructions() {
                match inst.kind {
                    InstructionKind::Gate(_) => sv.apply(inst),
                    InstructionKind::Measure => {
                        let bit = sv.measure(inst.qubits[0].0 as usize, &mut rng);
                        bits[inst.clbits[0].0 as usize] = bit;
                    }
                    InstructionKind::Reset => sv.reset(inst.qubits[0].0 as usize, &mut rng),
                    InstructionKind::Barrier => {}
                }
            }
            counts.insert(bitstring(&bits), 1);
        }
    }

    Ok(counts)
}

/// Render classical bits with bit 0 as the rightmost character.
fn bitstring(bits: &[bool]) -> String {
    bits.iter().rev().map(|&b| if b { '1' } else { '0' }).collect()
}

/// Provider for the local simulators.
///
/// Lists bare names; [`get_backend`](LocalProvider::get_backend) accepts
/// both `simulator` and the listed form `aer_simulator`.
#[derive(Debug, Clone)]
pub struct SimulatorProvider {
    max_qubits: u32,
    seed: Option<u64>,
}

impl SimulatorProvider {
    pub fn new() -> Self {
        Self {
            max_qubits: DEFAULT_MAX_QUBITS,
            seed: None,
        }
    }

    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for SimulatorProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalProvider for SimulatorProvider {
    fn backends(&self) -> HalResult<Vec<String>> {
        Ok(SIMULATOR_NAMES.iter().map(|n| (*n).to_string()).collect())
    }

    fn get_backend(&self, name: &str) -> HalResult<Arc<dyn Backend>> {
        let bare = name.strip_prefix(LOCAL_PREFIX).unwrap_or(name);
        if !SIMULATOR_NAMES.contains(&bare) {
            return Err(HalError::BackendNotFound(name.to_string()));
        }

        let mut backend = SimulatorBackend::new(bare).with_max_qubits(self.max_qubits);
        if let Some(seed) = self.seed {
            backend = backend.with_seed(seed);
        }
        Ok(Arc::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_ir::{ClbitId, QubitId};

    fn seeded(name: &str) -> SimulatorBackend {
        SimulatorBackend::new(name).with_seed(42)
    }

    #[tokio::test]
    async fn test_simulator_bell_state() {
        let backend = seeded("simulator");
        let circuit = Circuit::bell().unwrap();
        let result = backend.run(&circuit, 1000).await.unwrap();

        assert_eq!(result.shots, 1000);
        let counts = &result.counts;
        assert_eq!(counts.get("00") + counts.get("11"), 1000);
        assert_eq!(counts.get("01") + counts.get("10"), 0);
        assert!(counts.get("00") > 0 && counts.get("11") > 0);
    }

    #[tokio::test]
    async fn test_clbit_zero_is_rightmost() {
        let mut circuit = Circuit::with_size("x0", 2, 2);
        circuit
            .x(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .measure(QubitId(1), ClbitId(1))
            .unwrap();

        let result = seeded("simulator").run(&circuit, 50).await.unwrap();
        assert_eq!(result.counts.get("01"), 50);
    }

    #[tokio::test]
    async fn test_mid_circuit_measurement_and_reset() {
        let mut circuit = Circuit::with_size("mid", 1, 2);
        circuit
            .x(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .reset(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(1))
            .unwrap();

        let result = seeded("simulator").run(&circuit, 64).await.unwrap();
        assert_eq!(result.counts.get("01"), 64);
        assert_eq!(result.counts.total(), 64);
    }

    #[tokio::test]
    async fn test_seed_is_reproducible() {
        let mut circuit = Circuit::with_size("h", 3, 3);
        for q in 0..3 {
            circuit.h(QubitId(q)).unwrap();
        }
        for q in 0..3 {
            circuit.measure(QubitId(q), ClbitId(q)).unwrap();
        }

        let a = seeded("simulator").run(&circuit, 500).await.unwrap();
        let b = seeded("simulator").run(&circuit, 500).await.unwrap();
        assert_eq!(a.counts, b.counts);
    }

    #[tokio::test]
    async fn test_simulator_too_many_qubits() {
        let backend = SimulatorBackend::new("simulator").with_max_qubits(5);
        let circuit = Circuit::with_size("test", 10, 0);

        assert!(matches!(
            backend.transpile(&circuit),
            Err(HalError::CircuitTooLarge(_))
        ));
        assert!(matches!(
            backend.run(&circuit, 100).await,
            Err(HalError::CircuitTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_no_measurements_is_an_error() {
        let mut circuit = Circuit::with_size("bare", 1, 1);
        circuit.h(QubitId(0)).unwrap();
        let err = seeded("simulator").run(&circuit, 10).await.unwrap_err();
        assert!(err.to_string().contains("No counts for experiment"));
    }

    #[tokio::test]
    async fn test_zero_shots_rejected() {
        let circuit = Circuit::bell().unwrap();
        let result = seeded("simulator").run(&circuit, 0).await;
        assert!(matches!(result, Err(HalError::InvalidShots(_))));
    }

    #[test]
    fn test_provider_names() {
        let provider = SimulatorProvider::new();
        let names = provider.backends().unwrap();
        assert_eq!(names, vec!["simulator", "simulator_statevector", "qasm_simulator"]);

        assert_eq!(provider.get_backend("aer_simulator").unwrap().name(), "simulator");
        assert_eq!(provider.get_backend("qasm_simulator").unwrap().name(), "qasm_simulator");
        assert_eq!(
            provider.get_backend("aer_simulator_statevector").unwrap().name(),
            "simulator_statevector"
        );
        assert!(matches!(
            provider.get_backend("aer_unknown"),
            Err(HalError::BackendNotFound(_))
        ));
    }
}
