//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur in HAL operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Credentials were missing or refused by the backend.
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    /// The backend is temporarily unable to serve the request.
    #[error("Backend temporarily unavailable: {0}")]
    TransientUnavailable(String),

    /// The backend refused the circuit.
    #[error("Circuit rejected by backend: {diagnostic}")]
    CircuitRejected {
        /// Backend-provided explanation.
        diagnostic: String,
    },

    /// More shots requested than the backend allows.
    #[error("Requested {requested} shots but backend allows at most {max}")]
    ShotCountExceeded {
        /// Shots requested.
        requested: u32,
        /// Backend maximum.
        max: u32,
    },

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Circuit exceeds backend capabilities.
    #[error("Circuit requires {required} qubits but backend has {available}")]
    CircuitTooLarge {
        /// Qubits the circuit needs.
        required: u32,
        /// Qubits the backend has.
        available: u32,
    },

    /// Every attempt failed with a transient error.
    #[error("Backend unreachable after {attempts} attempt(s): {last_error}")]
    BackendUnreachable {
        /// Attempts made.
        attempts: u32,
        /// Message of the final transient error.
        last_error: String,
    },

    /// The request was cancelled.
    #[error("Execution cancelled")]
    Cancelled,

    /// The remote job ended in a failed state.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// The returned result does not match the request.
    #[error("Malformed result: expected {expected}, observed {observed}")]
    MalformedResult {
        /// What the request implied.
        expected: String,
        /// What the backend returned.
        observed: String,
    },

    /// The circuit does not fit the backend's gates or topology.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// An attempt exceeded its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decomposition error.
    #[error("Decomposition error: {0}")]
    Compile(#[from] qrun_compile::CompileError),

    /// Circuit construction error.
    #[error("Circuit error: {0}")]
    Ir(#[from] qrun_ir::IrError),
}

impl HalError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, HalError::TransientUnavailable(_) | HalError::Timeout(_))
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
