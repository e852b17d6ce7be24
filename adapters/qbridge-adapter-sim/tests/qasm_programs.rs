//! Simulate circuits parsed from OpenQASM 2 source.

use qbridge_adapter_sim::SimulatorProvider;
use qbridge_hal::LocalProvider;

async fn run(source: &str, shots: u32) -> qbridge_hal::Counts {
    let circuit = qbridge_qasm::parse(source).unwrap();
    let backend = SimulatorProvider::new()
        .with_seed(2024)
        .get_backend("aer_simulator")
        .unwrap();
    let lowered = backend.transpile(&circuit).unwrap();
    backend.run(&lowered, shots).await.unwrap().counts
}

#[tokio::test]
async fn test_bell_program() {
    let counts = run(
        r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0], q[1];
measure q -> c;
"#,
        1024,
    )
    .await;

    assert_eq!(counts.total(), 1024);
    assert_eq!(counts.len(), 2);
    assert!(counts.get("00") > 0);
    assert!(counts.get("11") > 0);
}

#[tokio::test]
async fn test_ghz_with_user_gate() {
    let counts = run(
        r#"OPENQASM 2.0;
include "qelib1.inc";
gate ghz a, b, c { h a; cx a, b; cx b, c; }
qreg q[3];
creg c[3];
ghz q[0], q[1], q[2];
measure q -> c;
"#,
        500,
    )
    .await;

    assert_eq!(counts.get("000") + counts.get("111"), 500);
}

#[tokio::test]
async fn test_deterministic_rotation() {
    let counts = run(
        r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
u3(pi, 0, pi) q[1];
measure q[0] -> c[0];
measure q[1] -> c[1];
"#,
        100,
    )
    .await;

    assert_eq!(counts.get("10"), 100);
}
