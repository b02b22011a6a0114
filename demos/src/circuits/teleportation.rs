//! Quantum teleportation, sender side.
//!
//! Qubits 1 and 2 share a Bell pair; the sender entangles qubit 0 with its
//! half and measures both. Without classical feed-forward the receiver's
//! correction is left to post-processing, so only `c0` and `c1` are
//! written and an ideal run is uniform over their four outcomes.

use qrun_ir::{Circuit, CircuitBuilder, IrResult};

/// Teleport |0⟩ from qubit 0 to qubit 2 and measure the sender's qubits.
pub fn teleportation_circuit(qubit_pool: u32, clbit_pool: u32) -> IrResult<Circuit> {
    let mut builder = CircuitBuilder::new("teleportation", qubit_pool, clbit_pool);
    let q = builder.alloc_qubits(3)?;
    let c = builder.alloc_clbits(3)?;

    builder
        .h(q[1])?
        .cx(q[1], q[2])?
        .cx(q[0], q[1])?
        .h(q[0])?
        .measure(q[0], c[0])?
        .measure(q[1], c[1])?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_ir::ClbitId;

    #[test]
    fn test_third_clbit_stays_unwritten() {
        let circuit = teleportation_circuit(24, 24).unwrap();
        assert_eq!(circuit.num_clbits(), 3);
        assert_eq!(circuit.measured_clbits(), vec![ClbitId(0), ClbitId(1)]);
    }
}
