//! Error types for the compilation crate.

use thiserror::Error;

use qrun_ir::QubitId;

/// Errors that can occur during decomposition.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qrun_ir::IrError),

    /// Missing coupling map for layout or routing.
    #[error("Missing coupling map for routing")]
    MissingCouplingMap,

    /// Missing layout for routing.
    #[error("Missing layout for routing")]
    MissingLayout,

    /// Missing native gate set.
    #[error("Missing native gate set for translation")]
    MissingNativeGates,

    /// No translation rule exists for an operation.
    #[error("Unsupported gate '{gate}': {reason}")]
    UnsupportedGate {
        /// Name of the offending operation.
        gate: String,
        /// Why no rule applies.
        reason: String,
    },

    /// The topology offers no path between two physical qubits.
    #[error("Routing infeasible: no path between physical qubits {from} and {to}")]
    RoutingInfeasible {
        /// Physical qubit routing started from.
        from: u32,
        /// Physical qubit routing tried to reach.
        to: u32,
    },

    /// Circuit too large for target.
    #[error("Circuit requires {required} qubits but target only has {available}")]
    CircuitTooLarge {
        /// Qubits the circuit allocates.
        required: u32,
        /// Physical qubits in the topology.
        available: u32,
    },

    /// Logical qubit missing from the layout.
    #[error("Qubit {0} has no physical location in the layout")]
    QubitNotMapped(QubitId),

    /// The native gate set cannot express arbitrary circuits.
    #[error("Invalid native gate set: {0}")]
    InvalidGateSet(String),

    /// Invalid topology description.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// A decomposed circuit violates the target constraints.
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
