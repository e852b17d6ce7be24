//! Text diagram renderer.
//!
//! Produces the box-drawing layout familiar from notebook tooling: one
//! three-row band per qubit, one bundled band per classical register,
//! adjacent bands sharing their boundary row.
//!
//! ```text
//!      ┌───┐     ┌─┐
//! q_0: ┤ H ├──■──┤M├───
//!      └───┘┌─┴─┐└╥┘┌─┐
//! q_1: ─────┤ X ├─╫─┤M├
//!           └───┘ ║ └╥┘
//! c: 2/═══════════╩══╩═
//!                 0  1
//! ```
//!
//! Instructions are packed greedily into columns: each one occupies the
//! contiguous band range between its first and last wire and lands in the
//! first column where that range is free. Every cell has an odd width so
//! vertical connectors line up on the column center.

use crate::circuit::Circuit;
use crate::gate::{StandardGate, format_angle};
use crate::instruction::{Instruction, InstructionKind};

const QUANTUM_WIRE: char = '─';
const CLASSICAL_WIRE: char = '═';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireKind {
    Quantum,
    Classical,
}

/// One cell of one band within a column.
#[derive(Debug, Clone)]
struct Cell {
    top: Vec<char>,
    mid: Vec<char>,
    bot: Vec<char>,
}

impl Cell {
    fn width(&self) -> usize {
        self.mid.len()
    }

    /// A single-character glyph with optional vertical connectors.
    fn glyph(center: char, up: bool, down: bool, vertical: char) -> Self {
        Self {
            top: vec![if up { vertical } else { ' ' }],
            mid: vec![center],
            bot: vec![if down { vertical } else { ' ' }],
        }
    }

    fn boxed(label: &str, up: bool, down: bool) -> Self {
        let label: Vec<char> = label.chars().collect();
        let width = label.len() + 4;
        let center = width / 2;
        let mut top = vec!['─'; width];
        let mut bot = vec!['─'; width];
        top[0] = '┌';
        top[width - 1] = '┐';
        bot[0] = '└';
        bot[width - 1] = '┘';
        if up {
            top[center] = '┴';
        }
        if down {
            bot[center] = '┬';
        }
        let mut mid = vec!['┤', ' '];
        mid.extend(label);
        mid.extend([' ', '├']);
        Self { top, mid, bot }
    }

    fn measure() -> Self {
        Self {
            top: "┌─┐".chars().collect(),
            mid: "┤M├".chars().collect(),
            bot: "└╥┘".chars().collect(),
        }
    }

    fn classical_target(index: u32) -> Self {
        let mut bot: Vec<char> = format!("{index:^3}").chars().collect();
        bot.truncate(3);
        Self {
            top: " ║ ".chars().collect(),
            mid: "═╩═".chars().collect(),
            bot,
        }
    }

    fn barrier() -> Self {
        Self {
            top: " ░ ".chars().collect(),
            mid: "─░─".chars().collect(),
            bot: " ░ ".chars().collect(),
        }
    }

    fn reset() -> Self {
        Self {
            top: vec![' '; 5],
            mid: "─|0>─".chars().collect(),
            bot: vec![' '; 5],
        }
    }

    /// Center this cell in a column of `width`, extending the wire.
    fn padded(&self, width: usize, wire: char) -> Self {
        let extra = width.saturating_sub(self.width());
        let left = extra / 2;
        let right = extra - left;
        let pad = |row: &[char], fill: char| -> Vec<char> {
            let mut out = vec![fill; left];
            out.extend_from_slice(row);
            out.extend(std::iter::repeat_n(fill, right));
            out
        };
        Self {
            top: pad(&self.top, ' '),
            mid: pad(&self.mid, wire),
            bot: pad(&self.bot, ' '),
        }
    }

    fn empty(width: usize, wire: char) -> Self {
        Self {
            top: vec![' '; width],
            mid: vec![wire; width],
            bot: vec![' '; width],
        }
    }
}

/// Box label for a gate, padded to odd length.
fn gate_label(gate: &StandardGate) -> String {
    let angles = |values: &[f64]| -> String {
        let rendered: Vec<String> = values.iter().copied().map(format_angle).collect();
        rendered.join(",")
    };
    let mut label = match gate {
        StandardGate::I => "I".to_string(),
        StandardGate::X | StandardGate::CX | StandardGate::CCX => "X".to_string(),
        StandardGate::Y | StandardGate::CY => "Y".to_string(),
        StandardGate::Z | StandardGate::CZ => "Z".to_string(),
        StandardGate::H | StandardGate::CH => "H".to_string(),
        StandardGate::S => "S".to_string(),
        StandardGate::Sdg => "Sdg".to_string(),
        StandardGate::T => "T".to_string(),
        StandardGate::Tdg => "Tdg".to_string(),
        StandardGate::SX => "√X".to_string(),
        StandardGate::SXdg => "√Xdg".to_string(),
        StandardGate::Rx(t) | StandardGate::CRx(t) => format!("Rx({})", angles(&[*t])),
        StandardGate::Ry(t) | StandardGate::CRy(t) => format!("Ry({})", angles(&[*t])),
        StandardGate::Rz(t) | StandardGate::CRz(t) => format!("Rz({})", angles(&[*t])),
        StandardGate::P(t) | StandardGate::CP(t) => format!("P({})", angles(&[*t])),
        StandardGate::U(a, b, c) | StandardGate::CU(a, b, c) => {
            format!("U({})", angles(&[*a, *b, *c]))
        }
        StandardGate::RXX(t) => format!("Rxx({})", angles(&[*t])),
        StandardGate::RZZ(t) => format!("Rzz({})", angles(&[*t])),
        StandardGate::Swap | StandardGate::CSwap => "X".to_string(),
    };
    if label.chars().count() % 2 == 0 {
        label.push(' ');
    }
    label
}

/// Band layout: qubits first, then one band per classical register.
struct Bands<'a> {
    circuit: &'a Circuit,
}

impl Bands<'_> {
    fn count(&self) -> usize {
        self.circuit.num_qubits() + self.circuit.cregs().len()
    }

    fn kind(&self, band: usize) -> WireKind {
        if band < self.circuit.num_qubits() {
            WireKind::Quantum
        } else {
            WireKind::Classical
        }
    }

    fn label(&self, band: usize) -> String {
        let n = self.circuit.num_qubits();
        if band < n {
            let q = &self.circuit.qubits()[band];
            format!("{}_{}: ", q.register, q.index)
        } else {
            let reg = &self.circuit.cregs()[band - n];
            format!("{}: {}/", reg.name, reg.size)
        }
    }

    /// Band of the register holding a classical bit, and the bit's index in it.
    fn clbit_band(&self, clbit: u32) -> Option<(usize, u32)> {
        let n = self.circuit.num_qubits();
        self.circuit
            .cregs()
            .iter()
            .position(|r| r.contains(clbit))
            .map(|i| (n + i, clbit - self.circuit.cregs()[i].offset))
    }

    /// Inclusive band range touched by an instruction.
    fn span(&self, inst: &Instruction) -> Option<(usize, usize)> {
        let mut bands: Vec<usize> = inst.qubits.iter().map(|q| q.0 as usize).collect();
        for c in &inst.clbits {
            bands.push(self.clbit_band(c.0)?.0);
        }
        let lo = *bands.iter().min()?;
        let hi = *bands.iter().max()?;
        Some((lo, hi))
    }

    /// Cells drawn for an instruction, keyed by band.
    fn cells(&self, inst: &Instruction, lo: usize, hi: usize) -> Vec<(usize, Cell)> {
        let operand = |band: usize| inst.qubits.iter().position(|q| q.0 as usize == band);
        let mut cells = vec![];
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let controls = gate.num_controls();
                let swap_like = matches!(gate, StandardGate::Swap | StandardGate::CSwap);
                let label = gate_label(gate);
                for band in lo..=hi {
                    let (up, down) = (band > lo, band < hi);
                    let cell = match operand(band) {
                        Some(i) if i < controls => Cell::glyph('■', up, down, '│'),
                        Some(_) if swap_like => Cell::glyph('X', up, down, '│'),
                        Some(_) => Cell::boxed(&label, up, down),
                        None => Cell::glyph('┼', true, true, '│'),
                    };
                    cells.push((band, cell));
                }
            }
            InstructionKind::Measure => {
                let target = inst.clbits.first().and_then(|c| self.clbit_band(c.0));
                for band in lo..=hi {
                    let cell = match (operand(band), target) {
                        (Some(_), _) => Cell::measure(),
                        (None, Some((t, index))) if t == band => Cell::classical_target(index),
                        _ => match self.kind(band) {
                            WireKind::Quantum => Cell::glyph('╫', true, true, '║'),
                            WireKind::Classical => Cell::glyph('╬', true, true, '║'),
                        },
                    };
                    cells.push((band, cell));
                }
            }
            InstructionKind::Reset => cells.push((lo, Cell::reset())),
            InstructionKind::Barrier => {
                for q in &inst.qubits {
                    cells.push((q.0 as usize, Cell::barrier()));
                }
            }
        }
        cells
    }
}

/// Overlay the bottom row of one band onto the top row of the next.
fn merge_rows(upper: &[char], lower: &[char]) -> String {
    upper
        .iter()
        .zip(lower)
        .map(|(&a, &b)| match (a, b) {
            (' ', b) => b,
            (a, ' ') => a,
            ('│' | '║', b) => b,
            (a, _) => a,
        })
        .collect()
}

impl Circuit {
    /// Render the circuit as a box-drawing text diagram.
    pub fn draw(&self) -> String {
        let bands = Bands { circuit: self };
        let count = bands.count();
        if count == 0 {
            return String::new();
        }

        // Greedy column packing.
        let mut columns: Vec<Vec<Option<Cell>>> = vec![];
        let mut next_free = vec![0usize; count];
        for inst in self.instructions() {
            let Some((lo, hi)) = bands.span(inst) else {
                continue;
            };
            let column = next_free[lo..=hi].iter().copied().max().unwrap_or(0);
            if column == columns.len() {
                columns.push(vec![None; count]);
            }
            for (band, cell) in bands.cells(inst, lo, hi) {
                columns[column][band] = Some(cell);
            }
            for slot in &mut next_free[lo..=hi] {
                *slot = column + 1;
            }
        }

        let labels: Vec<String> = (0..count).map(|b| bands.label(b)).collect();
        let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let mut top: Vec<Vec<char>> = vec![vec![' '; label_width]; count];
        let mut bot = top.clone();
        let mut mid: Vec<Vec<char>> = labels
            .iter()
            .map(|l| format!("{l:>label_width$}").chars().collect())
            .collect();

        for column in &columns {
            let width = column
                .iter()
                .flatten()
                .map(Cell::width)
                .max()
                .unwrap_or(1);
            for (band, cell) in column.iter().enumerate() {
                let wire = match bands.kind(band) {
                    WireKind::Quantum => QUANTUM_WIRE,
                    WireKind::Classical => CLASSICAL_WIRE,
                };
                let cell = match cell {
                    Some(cell) => cell.padded(width, wire),
                    None => Cell::empty(width, wire),
                };
                top[band].extend(cell.top);
                mid[band].extend(cell.mid);
                bot[band].extend(cell.bot);
            }
        }

        let mut lines = vec![top[0].iter().collect::<String>()];
        for band in 0..count {
            lines.push(mid[band].iter().collect());
            if band + 1 < count {
                lines.push(merge_rows(&bot[band], &top[band + 1]));
            }
        }
        let last: String = bot[count - 1].iter().collect();
        if bands.kind(count - 1) == WireKind::Classical {
            lines.push(last.trim_end().to_string());
        } else {
            lines.push(last);
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::{ClbitId, QubitId};
    use proptest::prelude::*;

    const BELL: &str = "     ┌───┐     ┌─┐   \n\
                        q_0: ┤ H ├──■──┤M├───\n\
                        \x20    └───┘┌─┴─┐└╥┘┌─┐\n\
                        q_1: ─────┤ X ├─╫─┤M├\n\
                        \x20         └───┘ ║ └╥┘\n\
                        c: 2/═══════════╩══╩═\n\
                        \x20               0  1";

    #[test]
    fn test_bell_diagram() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.draw(), BELL);
    }

    #[test]
    fn test_empty_circuit() {
        assert_eq!(Circuit::new("empty").draw(), "");
    }

    #[test]
    fn test_parameterized_label() {
        let mut circuit = Circuit::with_size("rot", 1, 0);
        circuit.rx(std::f64::consts::FRAC_PI_2, QubitId(0)).unwrap();
        let diagram = circuit.draw();
        assert!(diagram.contains("┤ Rx(π/2) ├"), "{diagram}");
    }

    #[test]
    fn test_crossing_wire() {
        let mut circuit = Circuit::with_size("cross", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let diagram = circuit.draw();
        let lines: Vec<&str> = diagram.lines().collect();
        assert!(lines[3].contains('┼'), "{diagram}");
    }

    #[test]
    fn test_measure_into_second_register() {
        let mut circuit = Circuit::new("regs");
        circuit.add_qreg("q", 1).unwrap();
        circuit.add_creg("a", 1).unwrap();
        circuit.add_creg("b", 2).unwrap();
        circuit.measure(QubitId(0), ClbitId(2)).unwrap();
        let diagram = circuit.draw();
        assert!(diagram.contains("a: 1/═╬═"), "{diagram}");
        assert!(diagram.contains("b: 2/═╩═"), "{diagram}");
        assert!(diagram.ends_with('1'), "{diagram}");
    }

    proptest! {
        #[test]
        fn test_band_rows_have_equal_width(ops in prop::collection::vec((0u32..3, 0u32..3, 0u8..4), 0..12)) {
            let mut circuit = Circuit::with_size("random", 3, 3);
            for (a, b, op) in ops {
                let _ = match op {
                    0 => circuit.h(QubitId(a)),
                    1 => circuit.cx(QubitId(a), QubitId(b)),
                    2 => circuit.rz(f64::from(b) * 0.3, QubitId(a)),
                    _ => circuit.measure(QubitId(a), ClbitId(b)),
                };
            }
            let diagram = circuit.draw();
            let lines: Vec<&str> = diagram.lines().collect();
            // The classical index row is trimmed; every other row spans the full width.
            let widths: Vec<usize> = lines[..lines.len() - 1].iter().map(|l| l.chars().count()).collect();
            prop_assert!(widths.windows(2).all(|w| w[0] == w[1]));
        }
    }
}
