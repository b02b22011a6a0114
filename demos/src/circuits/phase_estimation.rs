//! Quantum phase estimation.
//!
//! Three counting qubits read the phase of RZ rotations applied to a fourth
//! qubit, conditioned on each counting qubit in turn with angles π/4, π/2
//! and π. The counting register then goes through an inverse Fourier
//! transform and is measured.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use qrun_ir::{Circuit, CircuitBuilder, IrResult, Operation, StandardGate};

/// Number of counting qubits, and so bits of phase precision.
pub const PRECISION_BITS: u32 = 3;

/// Estimate the phase of the controlled RZ ladder to three bits.
pub fn phase_estimation_circuit(qubit_pool: u32, clbit_pool: u32) -> IrResult<Circuit> {
    let mut builder = CircuitBuilder::new("phase_estimation", qubit_pool, clbit_pool);
    let counting = builder.alloc_qubits(PRECISION_BITS)?;
    let eigen = builder.alloc_qubits(1)?[0];
    let c = builder.alloc_clbits(PRECISION_BITS)?;

    for &qubit in &counting {
        builder.h(qubit)?;
    }

    for (&control, theta) in counting.iter().zip([FRAC_PI_4, FRAC_PI_2, PI]) {
        builder.controlled(Operation::single(StandardGate::Rz(theta), eigen), [control])?;
    }

    let (q0, q1, q2) = (counting[0], counting[1], counting[2]);
    builder
        .h(q2)?
        .cp(FRAC_PI_2, q2, q1)?
        .h(q1)?
        .cp(FRAC_PI_4, q1, q0)?
        .cp(FRAC_PI_2, q2, q0)?
        .h(q0)?
        .swap(q0, q2)?;

    for (&qubit, &clbit) in counting.iter().zip(&c) {
        builder.measure(qubit, clbit)?;
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_ir::QubitId;

    #[test]
    fn test_rotations_target_the_eigen_qubit() {
        let circuit = phase_estimation_circuit(72, 72).unwrap();
        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.num_clbits(), 3);

        let controlled: Vec<_> = circuit
            .operations()
            .iter()
            .filter_map(|op| match op {
                Operation::Two {
                    gate: StandardGate::CRz(_),
                    control,
                    target,
                } => Some((*control, *target)),
                _ => None,
            })
            .collect();
        assert_eq!(controlled.len(), 3);
        for (i, (control, target)) in controlled.iter().enumerate() {
            assert_eq!(*target, QubitId(3));
            assert_eq!(*control, QubitId(i as u32));
        }
    }

    #[test]
    fn test_eigen_qubit_is_not_measured() {
        let circuit = phase_estimation_circuit(72, 72).unwrap();
        assert!(
            circuit
                .measurement_map()
                .iter()
                .all(|(_, qubit)| *qubit != QubitId(3))
        );
    }
}
