//! Circuit generators for the bundled algorithms.
//!
//! Every generator allocates its registers from a [`CircuitBuilder`] pool,
//! so a circuit that needs more qubits than the pool holds fails with
//! [`IrError::CapacityExceeded`](qrun_ir::IrError) instead of producing an
//! out-of-range index.

pub mod bell;
pub mod deutsch_jozsa;
pub mod grover;
pub mod phase_estimation;
pub mod qft;
pub mod random_number;
pub mod teleportation;

use std::fmt;

use clap::ValueEnum;
use qrun_ir::{Circuit, IrResult};

pub use bell::bell_circuit;
pub use deutsch_jozsa::deutsch_jozsa_circuit;
pub use grover::grover_circuit;
pub use phase_estimation::phase_estimation_circuit;
pub use qft::qft_circuit;
pub use random_number::random_number_circuit;
pub use teleportation::teleportation_circuit;

/// The algorithms `qrun-run` knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Algorithm {
    /// Two-qubit Bell state.
    Bell,
    /// Two-qubit Grover search for |11⟩.
    Grover,
    /// Deutsch–Jozsa on a two-bit constant oracle.
    DeutschJozsa,
    /// Three-qubit quantum Fourier transform.
    Qft,
    /// Three-bit phase estimation of a Z-rotation.
    PhaseEstimation,
    /// Uniform random number from 24 independent qubits.
    RandomNumber,
    /// Teleportation circuit measuring the sender's two qubits.
    Teleportation,
}

impl Algorithm {
    /// Every algorithm, in listing order.
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Bell,
        Algorithm::Grover,
        Algorithm::DeutschJozsa,
        Algorithm::Qft,
        Algorithm::PhaseEstimation,
        Algorithm::RandomNumber,
        Algorithm::Teleportation,
    ];

    /// Short machine-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Bell => "bell",
            Algorithm::Grover => "grover",
            Algorithm::DeutschJozsa => "deutsch-jozsa",
            Algorithm::Qft => "qft",
            Algorithm::PhaseEstimation => "phase-estimation",
            Algorithm::RandomNumber => "random-number",
            Algorithm::Teleportation => "teleportation",
        }
    }

    /// One-line description for listings.
    pub fn description(self) -> &'static str {
        match self {
            Algorithm::Bell => "Entangle two qubits into (|00⟩ + |11⟩)/√2",
            Algorithm::Grover => "Amplify the marked state |11⟩ in a 2-qubit search space",
            Algorithm::DeutschJozsa => "Decide whether a 2-bit oracle is constant or balanced",
            Algorithm::Qft => "Quantum Fourier transform on 3 qubits",
            Algorithm::PhaseEstimation => "Estimate the phase of controlled Z-rotations to 3 bits",
            Algorithm::RandomNumber => "Draw 24-bit random integers from Hadamard-prepared qubits",
            Algorithm::Teleportation => "Bell-measure a state onto a partner qubit",
        }
    }

    /// Shot count used when none is given.
    pub fn default_shots(self) -> u32 {
        match self {
            Algorithm::Bell | Algorithm::PhaseEstimation => 1000,
            Algorithm::RandomNumber => 10,
            Algorithm::Grover | Algorithm::DeutschJozsa | Algorithm::Qft | Algorithm::Teleportation => 8192,
        }
    }

    /// Number of qubits the circuit allocates.
    pub fn num_qubits(self) -> u32 {
        match self {
            Algorithm::Bell | Algorithm::Grover => 2,
            Algorithm::DeutschJozsa | Algorithm::Qft | Algorithm::Teleportation => 3,
            Algorithm::PhaseEstimation => 4,
            Algorithm::RandomNumber => random_number::BITS,
        }
    }

    /// Build the circuit, allocating from pools of the given sizes.
    pub fn build(self, qubit_pool: u32, clbit_pool: u32) -> IrResult<Circuit> {
        match self {
            Algorithm::Bell => bell_circuit(qubit_pool, clbit_pool),
            Algorithm::Grover => grover_circuit(qubit_pool, clbit_pool),
            Algorithm::DeutschJozsa => deutsch_jozsa_circuit(qubit_pool, clbit_pool),
            Algorithm::Qft => qft_circuit(qubit_pool, clbit_pool),
            Algorithm::PhaseEstimation => phase_estimation_circuit(qubit_pool, clbit_pool),
            Algorithm::RandomNumber => random_number_circuit(qubit_pool, clbit_pool),
            Algorithm::Teleportation => teleportation_circuit(qubit_pool, clbit_pool),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
