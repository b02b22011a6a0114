//! Quantum random number generation.
//!
//! Each qubit is put into an equal superposition and measured, giving one
//! uniformly random bit per qubit. Bitstrings are read MSB first, so the
//! result of a shot is an integer in `0..2^BITS`.

use qrun_ir::{Circuit, CircuitBuilder, IrResult};

/// Width of each random integer.
pub const BITS: u32 = 24;

/// Draw one `BITS`-bit integer per shot.
pub fn random_number_circuit(qubit_pool: u32, clbit_pool: u32) -> IrResult<Circuit> {
    let mut builder = CircuitBuilder::new("random_number", qubit_pool, clbit_pool);
    let q = builder.alloc_qubits(BITS)?;
    let c = builder.alloc_clbits(BITS)?;

    for (&qubit, &clbit) in q.iter().zip(&c) {
        builder.h(qubit)?.measure(qubit, clbit)?;
    }

    Ok(builder.build())
}
