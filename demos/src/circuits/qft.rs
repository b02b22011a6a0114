//! Quantum Fourier transform.

use std::f64::consts::PI;

use qrun_ir::{Circuit, CircuitBuilder, IrResult, QubitId};

/// Number of qubits transformed.
pub const QFT_QUBITS: u32 = 3;

/// Apply the QFT to |000⟩ and measure.
///
/// The input is the all-zero state, so an ideal run is uniform over the
/// eight outcomes.
pub fn qft_circuit(qubit_pool: u32, clbit_pool: u32) -> IrResult<Circuit> {
    let mut builder = CircuitBuilder::new("qft", qubit_pool, clbit_pool);
    let q = builder.alloc_qubits(QFT_QUBITS)?;
    let c = builder.alloc_clbits(QFT_QUBITS)?;

    apply_qft(&mut builder, &q)?;

    for (&qubit, &clbit) in q.iter().zip(&c) {
        builder.measure(qubit, clbit)?;
    }

    Ok(builder.build())
}

/// Append the QFT on `q`, ending with the qubit-order reversal.
pub fn apply_qft(builder: &mut CircuitBuilder, q: &[QubitId]) -> IrResult<()> {
    let n = q.len();
    for j in 0..n {
        builder.h(q[j])?;
        for k in (j + 1)..n {
            let theta = PI / f64::from(1u32 << (k - j));
            builder.cp(theta, q[k], q[j])?;
        }
    }
    for i in 0..n / 2 {
        builder.swap(q[i], q[n - 1 - i])?;
    }
    Ok(())
}
