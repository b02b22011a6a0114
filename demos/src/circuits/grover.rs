//! Two-qubit Grover search.
//!
//! With four candidates a single oracle plus diffusion round rotates the
//! state exactly onto the marked item, so an ideal run returns `11` on
//! every shot.

use qrun_ir::{Circuit, CircuitBuilder, IrResult, QubitId};

/// Search for |11⟩ among the four two-qubit basis states.
pub fn grover_circuit(qubit_pool: u32, clbit_pool: u32) -> IrResult<Circuit> {
    let mut builder = CircuitBuilder::new("grover", qubit_pool, clbit_pool);
    let q = builder.alloc_qubits(2)?;
    let c = builder.alloc_clbits(2)?;

    for &qubit in &q {
        builder.h(qubit)?;
    }

    apply_oracle(&mut builder, &q)?;
    apply_diffusion(&mut builder, &q)?;

    for (&qubit, &clbit) in q.iter().zip(&c) {
        builder.measure(qubit, clbit)?;
    }

    Ok(builder.build())
}

/// Phase-flip the marked state.
fn apply_oracle(builder: &mut CircuitBuilder, q: &[QubitId]) -> IrResult<()> {
    builder.x(q[0])?.x(q[1])?;
    controlled_z(builder, q)?;
    builder.x(q[0])?.x(q[1])?;
    Ok(())
}

/// Reflect about the uniform superposition.
fn apply_diffusion(builder: &mut CircuitBuilder, q: &[QubitId]) -> IrResult<()> {
    for &qubit in q {
        builder.h(qubit)?.x(qubit)?;
    }
    controlled_z(builder, q)?;
    for &qubit in q {
        builder.x(qubit)?.h(qubit)?;
    }
    Ok(())
}

/// CZ spelled as H·CX·H on the target.
fn controlled_z(builder: &mut CircuitBuilder, q: &[QubitId]) -> IrResult<()> {
    builder.h(q[1])?.cx(q[0], q[1])?.h(q[1])?;
    Ok(())
}
