//! Error types for the QCloud adapter.

use qrun_hal::HalError;
use thiserror::Error;

/// Result type for QCloud operations.
pub type QCloudResult<T> = Result<T, QCloudError>;

/// Errors that can occur when interacting with QCloud.
#[derive(Debug, Error)]
pub enum QCloudError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API key could not be read.
    #[error("Missing QCloud credential: {0}")]
    MissingCredential(String),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Machine selector not recognized.
    #[error("Unknown machine '{0}': expected 'origin_72' or 'full_amplitude'")]
    UnknownMachine(String),

    /// Operation has no OriginIR spelling.
    #[error("Unsupported gate for OriginIR: {0}")]
    UnsupportedGate(String),

    /// A finished task carried no usable result.
    #[error("Task {task_id} finished without {expected}")]
    MissingResult { task_id: String, expected: String },
}

impl From<QCloudError> for HalError {
    fn from(e: QCloudError) -> Self {
        match e {
            QCloudError::MissingCredential(msg) => HalError::AuthenticationFailure(msg),
            QCloudError::ApiError {
                status: 401 | 403, ..
            } => HalError::AuthenticationFailure(e.to_string()),
            QCloudError::ApiError {
                status: 400 | 422,
                message,
            } => HalError::CircuitRejected {
                diagnostic: message,
            },
            QCloudError::ApiError {
                status: 429 | 500..=599,
                ..
            } => HalError::TransientUnavailable(e.to_string()),
            QCloudError::ApiError { .. } => HalError::Configuration(e.to_string()),
            QCloudError::Http(ref err) if err.is_builder() => HalError::Configuration(e.to_string()),
            QCloudError::Http(ref err) if err.is_decode() => HalError::MalformedResult {
                expected: "task JSON".to_string(),
                observed: err.to_string(),
            },
            QCloudError::Http(_) => HalError::TransientUnavailable(e.to_string()),
            QCloudError::Json(err) => HalError::Serialization(err),
            QCloudError::TaskNotFound(id) => HalError::JobFailed(format!("task {id} not found")),
            QCloudError::UnknownMachine(_) => HalError::Configuration(e.to_string()),
            QCloudError::UnsupportedGate(_) => HalError::InvalidCircuit(e.to_string()),
            QCloudError::MissingResult { expected, .. } => HalError::MalformedResult {
                expected,
                observed: "no result payload".to_string(),
            },
        }
    }
}
