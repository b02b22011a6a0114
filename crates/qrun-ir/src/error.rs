//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use crate::register::RegisterKind;
use thiserror::Error;

/// Errors raised while allocating registers or building a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// The register pool does not have enough free slots.
    #[error("Cannot allocate {requested} {kind}(s): only {available} remaining")]
    CapacityExceeded {
        /// Which register was asked.
        kind: RegisterKind,
        /// Number of slots requested.
        requested: u32,
        /// Number of slots still free.
        available: u32,
    },

    /// An operation references an index that was never allocated.
    #[error(
        "{kind} {index} is not allocated ({allocated} allocated) in operation '{operation}'"
    )]
    InvalidReference {
        /// Which register the index belongs to.
        kind: RegisterKind,
        /// The offending index.
        index: u32,
        /// Number of indices allocated so far.
        allocated: u32,
        /// Name of the operation being appended.
        operation: String,
    },

    /// A classical bit was targeted by a second measurement.
    #[error("Classical bit {clbit} already holds the measurement of {first}; cannot measure {second} into it")]
    DuplicateMeasurement {
        /// The classical bit written twice.
        clbit: ClbitId,
        /// Qubit measured first.
        first: QubitId,
        /// Qubit of the rejected measurement.
        second: QubitId,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate placed in an operation of the wrong arity.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Controlled operation built without controls.
    #[error("Controlled '{gate_name}' needs at least one control qubit")]
    EmptyControls {
        /// Name of the base operation.
        gate_name: String,
    },

    /// Measurements cannot be controlled.
    #[error("Operation '{gate_name}' cannot be used as the base of a controlled gate")]
    InvalidControlBase {
        /// Name of the base operation.
        gate_name: String,
    },
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message() {
        let err = IrError::CapacityExceeded {
            kind: RegisterKind::Quantum,
            requested: 30,
            available: 24,
        };
        assert_eq!(
            err.to_string(),
            "Cannot allocate 30 qubit(s): only 24 remaining"
        );
    }

    #[test]
    fn test_duplicate_qubit_context() {
        let err = IrError::DuplicateQubit {
            qubit: QubitId(1),
            gate_name: Some("cx".into()),
        };
        assert!(err.to_string().ends_with("(gate: cx)"));
    }
}
