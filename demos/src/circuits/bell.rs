//! Bell state preparation.

use qrun_ir::{Circuit, CircuitBuilder, IrResult};

/// Prepare (|00⟩ + |11⟩)/√2 and measure both qubits.
///
/// An ideal run only ever reports `00` and `11`.
pub fn bell_circuit(qubit_pool: u32, clbit_pool: u32) -> IrResult<Circuit> {
    let mut builder = CircuitBuilder::new("bell", qubit_pool, clbit_pool);
    let q = builder.alloc_qubits(2)?;
    let c = builder.alloc_clbits(2)?;

    builder
        .h(q[0])?
        .cx(q[0], q[1])?
        .measure(q[0], c[0])?
        .measure(q[1], c[1])?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_ir::{ClbitId, QubitId};

    #[test]
    fn test_bell_matches_builtin() {
        let circuit = bell_circuit(72, 72).unwrap();
        let builtin = Circuit::bell().unwrap();
        assert_eq!(circuit.operations(), builtin.operations());
        assert_eq!(
            circuit.measurement_map(),
            vec![(ClbitId(0), QubitId(0)), (ClbitId(1), QubitId(1))]
        );
    }
}
