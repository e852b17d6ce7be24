//! Execution coordinator: local or remote execution, normalized outcomes.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, error, info, instrument, warn};

use qbridge_hal::{Counts, HalResult, QuasiDistribution, RuntimeService, RuntimeSession};
use qbridge_ir::Circuit;

use crate::builder::render_drawing;
use crate::capability::Capabilities;
use crate::compiler::{compile_with_limit, panic_message};
use crate::outcome::ExecutionOutcome;

pub const DEFAULT_SHOTS: u32 = 1024;
pub const DEFAULT_BACKEND: &str = "aer_simulator";
/// Local alias retried when a requested simulator cannot be resolved.
pub const FALLBACK_BACKEND: &str = "qasm_simulator";
/// Drawing attached when no circuit could be rendered.
pub const DRAWING_UNAVAILABLE: &str = "Could not generate circuit drawing";
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(300);
pub use qbridge_qasm::DEFAULT_MAX_WIRES;

/// Whether a backend name selects the local simulator path.
pub fn is_local(backend: &str) -> bool {
    backend.starts_with("aer_") || backend == FALLBACK_BACKEND
}

/// Convert a quasi-probability distribution into counts.
///
/// Each probability is scaled by `shots` and rounded half-to-even. Outcomes
/// that round to zero or below are dropped. Keys are zero-padded binary
/// strings of width `num_clbits`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quasi_to_counts(dist: &QuasiDistribution, shots: u32, num_clbits: usize) -> Counts {
    dist.iter()
        .filter_map(|(outcome, probability)| {
            let count = (probability * f64::from(shots)).round_ties_even();
            (count >= 1.0).then(|| (format!("{outcome:0num_clbits$b}"), count as u64))
        })
        .collect()
}

/// Runs circuits against whichever capabilities were acquired at startup.
#[derive(Debug, Clone)]
pub struct Coordinator {
    caps: Capabilities,
    remote_timeout: Duration,
    max_wires: u32,
}

impl Coordinator {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            max_wires: DEFAULT_MAX_WIRES,
        }
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Cap on declared qubits, and separately on classical bits, accepted
    /// from circuit source.
    pub fn with_max_wires(mut self, max_wires: u32) -> Self {
        self.max_wires = max_wires;
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn max_wires(&self) -> u32 {
        self.max_wires
    }

    /// Compile and execute `source` on `backend`.
    ///
    /// Never fails and never panics: every failure, including a panic in a
    /// provider, becomes an [`ExecutionOutcome::Error`] with a drawing attached.
    #[instrument(skip(self, source))]
    pub async fn execute(&self, source: &str, shots: u32, backend: &str) -> ExecutionOutcome {
        match AssertUnwindSafe(self.execute_inner(source, shots, backend))
            .catch_unwind()
            .await
        {
            Ok(outcome) => {
                if let ExecutionOutcome::Error { message, .. } = &outcome {
                    warn!(%message, "execution failed");
                }
                outcome
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "execution panicked");
                ExecutionOutcome::error(
                    format!("Error executing circuit: {message}"),
                    best_effort_drawing(source, self.max_wires),
                    backend,
                )
            }
        }
    }

    async fn execute_inner(&self, source: &str, shots: u32, backend: &str) -> ExecutionOutcome {
        let circuit = match compile_with_limit(source, self.max_wires) {
            Ok(circuit) => circuit,
            Err(e) => {
                return ExecutionOutcome::error(
                    format!("Error executing circuit: {e}"),
                    DRAWING_UNAVAILABLE,
                    backend,
                );
            }
        };
        let drawing = render_drawing(&circuit);

        if shots == 0 {
            return ExecutionOutcome::error(
                "Error executing circuit: shots must be a positive integer",
                drawing,
                backend,
            );
        }

        if is_local(backend) {
            self.run_local(&circuit, shots, backend, drawing).await
        } else {
            self.run_remote(&circuit, shots, backend, drawing).await
        }
    }

    async fn run_local(
        &self,
        circuit: &Circuit,
        shots: u32,
        backend: &str,
        drawing: String,
    ) -> ExecutionOutcome {
        let Some(local) = self.caps.local() else {
            return ExecutionOutcome::error(
                "Local simulator not available. Set backends.simulator_enabled to true.",
                drawing,
                backend,
            );
        };

        let (resolved, backend_name) = match local.get_backend(backend) {
            Ok(resolved) => (resolved, backend.to_string()),
            Err(e) if backend == FALLBACK_BACKEND => {
                return ExecutionOutcome::error(
                    format!(
                        "Requested simulator '{backend}' not available: {e}. \
                         Set backends.simulator_enabled to true."
                    ),
                    drawing,
                    backend,
                );
            }
            Err(e) => {
                warn!(requested = backend, error = %e, "falling back to {FALLBACK_BACKEND}");
                match local.get_backend(FALLBACK_BACKEND) {
                    Ok(resolved) => (resolved, format!("{FALLBACK_BACKEND} (fallback)")),
                    Err(e) => {
                        return ExecutionOutcome::error(
                            format!(
                                "No simulator available: {e}. \
                                 Set backends.simulator_enabled to true."
                            ),
                            drawing,
                            backend,
                        );
                    }
                }
            }
        };

        let start = Instant::now();
        let result = match resolved.transpile(circuit) {
            Ok(lowered) => resolved.run(&lowered, shots).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(result) => {
                let execution_time = start.elapsed().as_secs_f64();
                info!(backend = %backend_name, shots, execution_time, "local execution finished");
                ExecutionOutcome::Success {
                    counts: result.counts,
                    circuit_drawing: drawing,
                    backend_name,
                    execution_time,
                }
            }
            Err(e) => ExecutionOutcome::error(
                format!("Error executing circuit: {e}"),
                drawing,
                backend_name,
            ),
        }
    }

    async fn run_remote(
        &self,
        circuit: &Circuit,
        shots: u32,
        backend: &str,
        drawing: String,
    ) -> ExecutionOutcome {
        if self.caps.cloud().is_none() {
            return ExecutionOutcome::error(
                "IBM Quantum provider not available. Set backends.ibm_enabled to true \
                 and configure an IBM Quantum token.",
                drawing,
                backend,
            );
        }
        let Some(runtime) = self.caps.runtime() else {
            return ExecutionOutcome::error(
                "IBM Quantum Runtime not available. Set backends.ibm_enabled to true.",
                drawing,
                backend,
            );
        };

        let sampled = tokio::time::timeout(
            self.remote_timeout,
            sample_in_session(runtime.as_ref(), circuit, shots, backend),
        )
        .await;

        match sampled {
            Ok(Ok((dist, execution_time))) => {
                info!(backend, shots, execution_time, "remote execution finished");
                ExecutionOutcome::Success {
                    counts: quasi_to_counts(&dist, shots, circuit.num_clbits()),
                    circuit_drawing: drawing,
                    backend_name: backend.to_string(),
                    execution_time,
                }
            }
            Ok(Err(e)) => ExecutionOutcome::error(
                format!(
                    "Error using IBM Quantum Runtime: {e}. \
                     Make sure you have the right access permissions."
                ),
                drawing,
                backend,
            ),
            Err(_) => ExecutionOutcome::error(
                format!(
                    "Error using IBM Quantum Runtime: no result from '{backend}' within {}s. \
                     The session was closed; try again later.",
                    self.remote_timeout.as_secs()
                ),
                drawing,
                backend,
            ),
        }
    }
}

/// Open a session, sample once, and close the session on every path.
async fn sample_in_session(
    runtime: &dyn RuntimeService,
    circuit: &Circuit,
    shots: u32,
    backend: &str,
) -> HalResult<(QuasiDistribution, f64)> {
    let session = SessionGuard::new(runtime.open_session(backend).await?);
    debug!(session = session.id(), backend, "runtime session opened");

    let start = Instant::now();
    let sampled = session.sample(circuit, shots).await;
    let elapsed = start.elapsed().as_secs_f64();

    session.close().await;
    Ok((sampled?, elapsed))
}

/// Owns an open runtime session until it is closed.
///
/// Dropped without [`SessionGuard::close`] (a panic or a cancelled future),
/// the guard hands the close to the current tokio runtime.
struct SessionGuard {
    session: Arc<dyn RuntimeSession>,
    armed: bool,
}

impl SessionGuard {
    fn new(session: Box<dyn RuntimeSession>) -> Self {
        Self {
            session: Arc::from(session),
            armed: true,
        }
    }

    fn id(&self) -> &str {
        self.session.id()
    }

    async fn sample(&self, circuit: &Circuit, shots: u32) -> HalResult<QuasiDistribution> {
        self.session.sample(circuit, shots).await
    }

    async fn close(mut self) {
        if let Err(e) = self.session.close().await {
            warn!(session = self.session.id(), error = %e, "failed to close runtime session");
        }
        self.armed = false;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let session = self.session.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(session = session.id(), "closing abandoned runtime session");
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!(session = session.id(), error = %e, "failed to close runtime session");
                    }
                });
            }
            Err(_) => warn!(
                session = session.id(),
                "no runtime available, session left open"
            ),
        }
    }
}

/// Diagram for an error outcome, re-parsing the source if possible.
fn best_effort_drawing(source: &str, max_wires: u32) -> String {
    compile_with_limit(source, max_wires).map_or_else(|_| DRAWING_UNAVAILABLE.to_string(), |c| render_drawing(&c))
}
