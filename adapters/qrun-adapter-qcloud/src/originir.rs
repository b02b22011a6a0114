//! OriginIR serialization of decomposed circuits.
//!
//! ```text
//! QINIT 2
//! CREG 2
//! H q[0]
//! CNOT q[0],q[1]
//! MEASURE q[0],c[0]
//! MEASURE q[1],c[1]
//! ```
//!
//! Angles are written in radians with full `f64` precision.

use std::fmt::Write;

use qrun_compile::DecomposedCircuit;
use qrun_ir::{Operation, StandardGate};

use crate::error::{QCloudError, QCloudResult};

/// Names every gate [`emit`] can spell.
pub const ORIGINIR_GATES: &[&str] = &[
    "h", "x", "y", "z", "s", "t", "rx", "ry", "rz", "p", "u", "cx", "cz", "cp", "swap", "ccx",
];

/// Number of qubits the program declares: one past the highest physical
/// qubit it touches.
pub fn qubit_count(circuit: &DecomposedCircuit) -> u32 {
    circuit.used_physical_qubits().last().map_or(1, |q| q + 1)
}

/// Serialize a decomposed circuit to OriginIR text.
pub fn emit(circuit: &DecomposedCircuit) -> QCloudResult<String> {
    let mut out = String::new();
    let _ = writeln!(out, "QINIT {}", qubit_count(circuit));
    let _ = writeln!(out, "CREG {}", circuit.num_clbits().max(1));

    for op in circuit.operations() {
        let _ = writeln!(out, "{}", line(op)?);
    }
    Ok(out)
}

fn line(op: &Operation) -> QCloudResult<String> {
    let unsupported = || QCloudError::UnsupportedGate(op.name());

    let text = match op {
        Operation::Single { gate, qubit } => {
            let q = qubit.0;
            match gate {
                StandardGate::H => format!("H q[{q}]"),
                StandardGate::X => format!("X q[{q}]"),
                StandardGate::Y => format!("Y q[{q}]"),
                StandardGate::Z => format!("Z q[{q}]"),
                StandardGate::S => format!("S q[{q}]"),
                StandardGate::T => format!("T q[{q}]"),
                StandardGate::Rx(theta) => format!("RX q[{q}],({theta})"),
                StandardGate::Ry(theta) => format!("RY q[{q}],({theta})"),
                StandardGate::Rz(theta) => format!("RZ q[{q}],({theta})"),
                StandardGate::P(theta) => format!("U1 q[{q}],({theta})"),
                StandardGate::U(theta, phi, lambda) => format!("U3 q[{q}],({theta},{phi},{lambda})"),
                _ => return Err(unsupported()),
            }
        }
        Operation::Two {
            gate,
            control,
            target,
        } => {
            let (c, t) = (control.0, target.0);
            match gate {
                StandardGate::CX => format!("CNOT q[{c}],q[{t}]"),
                StandardGate::CZ => format!("CZ q[{c}],q[{t}]"),
                StandardGate::CP(theta) => format!("CR q[{c}],q[{t}],({theta})"),
                _ => return Err(unsupported()),
            }
        }
        Operation::Swap { a, b } => format!("SWAP q[{}],q[{}]", a.0, b.0),
        Operation::Controlled { base, controls } => match (base.as_ref(), controls.as_slice()) {
            (
                Operation::Single {
                    gate: StandardGate::X,
                    qubit,
                },
                [c1, c2],
            ) => format!("TOFFOLI q[{}],q[{}],q[{}]", c1.0, c2.0, qubit.0),
            _ => return Err(unsupported()),
        },
        Operation::Measure { qubit, clbit } => format!("MEASURE q[{}],c[{}]", qubit.0, clbit.0),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_compile::{CouplingMap, Decomposer, NativeGateSet};
    use qrun_ir::{Circuit, CircuitBuilder, QubitId};

    fn decompose(circuit: &Circuit, map: CouplingMap, natives: NativeGateSet) -> DecomposedCircuit {
        Decomposer::new(map, natives).decompose(circuit).unwrap()
    }

    #[test]
    fn test_bell_program() {
        let bell = decompose(
            &Circuit::bell().unwrap(),
            CouplingMap::full(4),
            NativeGateSet::from_names(ORIGINIR_GATES.iter().copied()).unwrap(),
        );
        let program = emit(&bell).unwrap();
        assert_eq!(
            program,
            "QINIT 2\nCREG 2\nH q[0]\nCNOT q[0],q[1]\nMEASURE q[0],c[0]\nMEASURE q[1],c[1]\n"
        );
    }

    #[test]
    fn test_origin_natives_are_expressible() {
        let mut builder = CircuitBuilder::with_size("mixed", 3, 3);
        let q = |i| QubitId(i);
        builder.h(q(0)).unwrap();
        builder.cp(0.5, q(0), q(2)).unwrap();
        builder.ccx(q(0), q(1), q(2)).unwrap();
        builder.measure_all().unwrap();

        let decomposed = decompose(&builder.build(), CouplingMap::grid(6, 12), NativeGateSet::origin());
        let program = emit(&decomposed).unwrap();

        assert!(program.starts_with("QINIT "));
        for line in program.lines().skip(2) {
            let keyword = line.split_whitespace().next().unwrap();
            assert!(
                matches!(keyword, "RX" | "RY" | "RZ" | "CZ" | "MEASURE"),
                "unexpected line {line}"
            );
        }
        assert_eq!(program.matches("MEASURE").count(), 3);
    }

    #[test]
    fn test_angles_and_controlled_forms() {
        let mut builder = CircuitBuilder::with_size("angles", 3, 1);
        builder.rz(std::f64::consts::FRAC_PI_2, QubitId(0)).unwrap();
        builder.cp(std::f64::consts::PI, QubitId(1), QubitId(0)).unwrap();
        builder.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        builder.u(0.1, 0.2, 0.3, QubitId(2)).unwrap();
        builder.measure(QubitId(2), qrun_ir::ClbitId(0)).unwrap();

        let decomposed = decompose(&builder.build(), CouplingMap::full(3), NativeGateSet::universal());
        let program = emit(&decomposed).unwrap();

        assert!(program.contains("RZ q[0],(1.5707963267948966)"));
        assert!(program.contains("CR q[1],q[0],(3.141592653589793)"));
        assert!(program.contains("TOFFOLI q[0],q[1],q[2]"));
        assert!(program.contains("U3 q[2],(0.1,0.2,0.3)"));
        assert!(program.contains("CREG 1"));
    }

    #[test]
    fn test_unsupported_gate() {
        let mut builder = CircuitBuilder::with_size("sdg", 1, 1);
        builder.sdg(QubitId(0)).unwrap();
        let decomposed = decompose(&builder.build(), CouplingMap::full(1), NativeGateSet::universal());
        assert!(matches!(
            emit(&decomposed),
            Err(QCloudError::UnsupportedGate(name)) if name == "sdg"
        ));
    }
}
