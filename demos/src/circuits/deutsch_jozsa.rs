//! Deutsch–Jozsa with a constant oracle.
//!
//! Two input qubits and one ancilla prepared in |−⟩. The oracle is the
//! constant function f(x) = 0, which acts as the identity, so an ideal run
//! measures `00` on the inputs. Any other outcome would mean the oracle is
//! balanced.

use qrun_ir::{Circuit, CircuitBuilder, IrResult};

/// Run Deutsch–Jozsa on the two-bit constant-zero oracle.
pub fn deutsch_jozsa_circuit(qubit_pool: u32, clbit_pool: u32) -> IrResult<Circuit> {
    let mut builder = CircuitBuilder::new("deutsch_jozsa", qubit_pool, clbit_pool);
    let q = builder.alloc_qubits(3)?;
    let c = builder.alloc_clbits(2)?;
    let (inputs, ancilla) = (&q[..2], q[2]);

    builder.x(ancilla)?;
    for &qubit in &q {
        builder.h(qubit)?;
    }

    // f(x) = 0 leaves every qubit untouched.

    for &qubit in inputs {
        builder.h(qubit)?;
    }
    for (&qubit, &clbit) in inputs.iter().zip(&c) {
        builder.measure(qubit, clbit)?;
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_ir::{ClbitId, QubitId};

    #[test]
    fn test_only_inputs_are_measured() {
        let circuit = deutsch_jozsa_circuit(24, 24).unwrap();
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(
            circuit.measurement_map(),
            vec![(ClbitId(0), QubitId(0)), (ClbitId(1), QubitId(1))]
        );
        assert_eq!(circuit.operations()[0].name(), "x");
    }
}
