//! Statevector simulation engine.
//!
//! Basis index bit `k` holds qubit `k`. Gates are applied as 2x2 matrices on
//! a target qubit, optionally conditioned on a control mask; swaps and the
//! two-qubit Ising rotations have their own kernels.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use qbridge_ir::{Instruction, InstructionKind, StandardGate};

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// A statevector over `num_qubits` qubits.
#[derive(Debug, Clone)]
pub struct Statevector {
    amplitudes: Vec<Complex64>,
}

impl Statevector {
    /// Create a statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self { amplitudes }
    }

    /// Apply a unitary instruction (gate). Measure and reset need randomness
    /// and go through [`measure`](Self::measure) / [`reset`](Self::reset);
    /// barriers are no-ops.
    pub fn apply(&mut self, instruction: &Instruction) {
        if let InstructionKind::Gate(gate) = &instruction.kind {
            let qubits: Vec<usize> = instruction.qubits.iter().map(|q| q.0 as usize).collect();
            self.apply_gate(gate, &qubits);
        }
    }

    fn apply_gate(&mut self, gate: &StandardGate, q: &[usize]) {
        match gate {
            StandardGate::Swap => self.apply_swap(0, q[0], q[1]),
            StandardGate::CSwap => self.apply_swap(1 << q[0], q[1], q[2]),
            StandardGate::RZZ(theta) => self.apply_rzz(q[0], q[1], *theta),
            StandardGate::RXX(theta) => self.apply_rxx(q[0], q[1], *theta),
            StandardGate::CCX => self.apply_controlled((1 << q[0]) | (1 << q[1]), q[2], &x()),
            other => {
                let controls = other.num_controls();
                let mask = q[..controls].iter().fold(0, |m, c| m | (1 << c));
                if let Some(matrix) = base_matrix(other) {
                    self.apply_controlled(mask, q[controls], &matrix);
                }
            }
        }
    }

    /// Apply `matrix` to `target` on every basis state whose `controls` bits are set.
    fn apply_controlled(&mut self, controls: usize, target: usize, matrix: &Matrix2) {
        let tgt = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & tgt == 0 && i & controls == controls {
                let j = i | tgt;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = matrix[0][0] * a + matrix[0][1] * b;
                self.amplitudes[j] = matrix[1][0] * a + matrix[1][1] * b;
            }
        }
    }

    fn apply_swap(&mut self, controls: usize, q1: usize, q2: usize) {
        let (m1, m2) = (1 << q1, 1 << q2);
        for i in 0..self.amplitudes.len() {
            if i & controls == controls && i & m1 != 0 && i & m2 == 0 {
                self.amplitudes.swap(i, (i & !m1) | m2);
            }
        }
    }

    fn apply_rzz(&mut self, q1: usize, q2: usize, theta: f64) {
        let same = Complex64::from_polar(1.0, -theta / 2.0);
        let differ = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            let parity = ((i >> q1) ^ (i >> q2)) & 1;
            *amp *= if parity == 0 { same } else { differ };
        }
    }

    fn apply_rxx(&mut self, q1: usize, q2: usize, theta: f64) {
        let flip = (1 << q1) | (1 << q2);
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new(0.0, -(theta / 2.0).sin());
        for i in 0..self.amplitudes.len() {
            let j = i ^ flip;
            if i < j {
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    /// Probability of reading `1` on a qubit.
    pub fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Measure a qubit, collapsing the state. Returns the observed bit.
    pub fn measure<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let p1 = self.probability_one(qubit);
        let outcome = rng.r#gen::<f64>() < p1;
        let kept = if outcome { p1 } else { 1.0 - p1 };
        let norm = kept.sqrt();
        let mask = 1 << qubit;
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome && norm > 0.0 {
                *amp /= norm;
            } else {
                *amp = ZERO;
            }
        }
        outcome
    }

    /// Reset a qubit to |0⟩: measure, then flip if it read `1`.
    pub fn reset<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) {
        if self.measure(qubit, rng) {
            self.apply_controlled(0, qubit, &x());
        }
    }

    /// Cumulative distribution over basis states, for repeated sampling.
    pub fn cumulative_probabilities(&self) -> Vec<f64> {
        let mut total = 0.0;
        self.amplitudes
            .iter()
            .map(|a| {
                total += a.norm_sqr();
                total
            })
            .collect()
    }
}

/// Draw a basis index from a cumulative distribution.
pub fn sample_index<R: Rng + ?Sized>(cumulative: &[f64], rng: &mut R) -> usize {
    let total = cumulative.last().copied().unwrap_or(1.0);
    let r = rng.r#gen::<f64>() * total;
    cumulative
        .partition_point(|&c| c <= r)
        .min(cumulative.len().saturating_sub(1))
}

fn x() -> Matrix2 {
    [[ZERO, ONE], [ONE, ZERO]]
}

fn diag(phase: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, phase)]]
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn u(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        [ONE * c, -Complex64::from_polar(s, lambda)],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

/// The single-qubit matrix acting on the target of a (possibly controlled) gate.
fn base_matrix(gate: &StandardGate) -> Option<Matrix2> {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let half_p = Complex64::new(0.5, 0.5);
    let half_m = Complex64::new(0.5, -0.5);
    Some(match gate {
        StandardGate::I => [[ONE, ZERO], [ZERO, ONE]],
        StandardGate::X | StandardGate::CX => x(),
        StandardGate::Y | StandardGate::CY => [[ZERO, -I], [I, ZERO]],
        StandardGate::Z | StandardGate::CZ => diag(PI),
        StandardGate::H | StandardGate::CH => [[h, h], [h, -h]],
        StandardGate::S => diag(PI / 2.0),
        StandardGate::Sdg => diag(-PI / 2.0),
        StandardGate::T => diag(PI / 4.0),
        StandardGate::Tdg => diag(-PI / 4.0),
        StandardGate::SX => [[half_p, half_m], [half_m, half_p]],
        StandardGate::SXdg => [[half_m, half_p], [half_p, half_m]],
        StandardGate::Rx(t) | StandardGate::CRx(t) => rx(*t),
        StandardGate::Ry(t) | StandardGate::CRy(t) => ry(*t),
        StandardGate::Rz(t) | StandardGate::CRz(t) => rz(*t),
        StandardGate::P(t) | StandardGate::CP(t) => diag(*t),
        StandardGate::U(t, p, l) | StandardGate::CU(t, p, l) => u(*t, *p, *l),
        StandardGate::Swap
        | StandardGate::CSwap
        | StandardGate::CCX
        | StandardGate::RXX(_)
        | StandardGate::RZZ(_) => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_ir::QubitId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn gate(g: StandardGate, qubits: &[u32]) -> Instruction {
        Instruction::gate(g, qubits.iter().map(|&q| QubitId(q)))
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], ONE));
        assert!(sv.amplitudes[1..].iter().all(|a| approx_eq(*a, ZERO)));
    }

    #[test]
    fn test_hadamard() {
        let mut sv = Statevector::new(1);
        sv.apply(&gate(StandardGate::H, &[0]));
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(FRAC_1_SQRT_2, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(FRAC_1_SQRT_2, 0.0)));
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply(&gate(StandardGate::H, &[0]));
        sv.apply(&gate(StandardGate::CX, &[0, 1]));

        let r = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(sv.amplitudes[0], r));
        assert!(approx_eq(sv.amplitudes[1], ZERO));
        assert!(approx_eq(sv.amplitudes[2], ZERO));
        assert!(approx_eq(sv.amplitudes[3], r));
    }

    #[test]
    fn test_sx_squared_is_x() {
        let mut sv = Statevector::new(1);
        sv.apply(&gate(StandardGate::SX, &[0]));
        sv.apply(&gate(StandardGate::SX, &[0]));
        assert!((sv.probability_one(0) - 1.0).abs() < 1e-10);

        sv.apply(&gate(StandardGate::SXdg, &[0]));
        sv.apply(&gate(StandardGate::SXdg, &[0]));
        assert!(sv.probability_one(0).abs() < 1e-10);
    }

    #[test]
    fn test_u_matches_rotations() {
        let mut a = Statevector::new(1);
        a.apply(&gate(StandardGate::U(PI / 2.0, 0.0, PI), &[0]));
        let mut b = Statevector::new(1);
        b.apply(&gate(StandardGate::H, &[0]));
        for (x, y) in a.amplitudes.iter().zip(&b.amplitudes) {
            assert!(approx_eq(*x, *y));
        }
    }

    #[test]
    fn test_toffoli_and_fredkin() {
        let mut sv = Statevector::new(3);
        sv.apply(&gate(StandardGate::X, &[0]));
        sv.apply(&gate(StandardGate::X, &[1]));
        sv.apply(&gate(StandardGate::CCX, &[0, 1, 2]));
        assert!(approx_eq(sv.amplitudes[0b111], ONE));

        sv.apply(&gate(StandardGate::X, &[1]));
        sv.apply(&gate(StandardGate::CSwap, &[0, 1, 2]));
        assert!(approx_eq(sv.amplitudes[0b011], ONE));
    }

    #[test]
    fn test_rxx_pi_flips_both() {
        let mut sv = Statevector::new(2);
        sv.apply(&gate(StandardGate::RXX(PI), &[0, 1]));
        assert!((sv.amplitudes[0b11].norm_sqr() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_rzz_phase_only() {
        let mut sv = Statevector::new(2);
        sv.apply(&gate(StandardGate::H, &[0]));
        sv.apply(&gate(StandardGate::RZZ(PI / 3.0), &[0, 1]));
        assert!((sv.probability_one(0) - 0.5).abs() < 1e-10);
        assert!(sv.probability_one(1).abs() < 1e-10);
    }

    #[test]
    fn test_measure_collapses() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sv = Statevector::new(2);
        sv.apply(&gate(StandardGate::H, &[0]));
        sv.apply(&gate(StandardGate::CX, &[0, 1]));

        let first = sv.measure(0, &mut rng);
        let expected = if first { 1.0 } else { 0.0 };
        assert!((sv.probability_one(1) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sv = Statevector::new(1);
        sv.apply(&gate(StandardGate::X, &[0]));
        sv.reset(0, &mut rng);
        assert!(approx_eq(sv.amplitudes[0], ONE));
    }

    #[test]
    fn test_sample_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sv = Statevector::new(1);
        sv.apply(&gate(StandardGate::X, &[0]));
        let cumulative = sv.cumulative_probabilities();
        for _ in 0..100 {
            assert_eq!(sample_index(&cumulative, &mut rng), 1);
        }
    }
}
