//! qrun adapter for Origin QCloud
//!
//! This crate provides a [`Backend`] for the Origin QCloud service: the
//! 72-qubit superconducting chip and the full-amplitude cloud simulator.
//! Decomposed circuits are serialized to OriginIR and submitted as REST
//! tasks; finished tasks report counts or probabilities, which are converted
//! to [`Counts`](qrun_hal::Counts) over the requested shot count.
//!
//! # Machines
//!
//! | Selector | Topology | Native gates | Max shots |
//! |----------|----------|--------------|-----------|
//! | `origin_72` | 6x12 grid | RZ, RX, RY, CZ | 10 000 |
//! | `full_amplitude` | all-to-all (32) | H, X, Y, Z, S, T, RX, RY, RZ, U1, U3, CNOT, CZ, CR, SWAP, TOFFOLI | 100 000 |
//!
//! # Authentication
//!
//! The API key is read from the environment variable named by
//! [`BackendConfig::credential_var`](qrun_hal::BackendConfig) (`API_KEY` by
//! default) and sent as a Bearer token.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use qrun_adapter_qcloud::QCloudBackend;
//! use qrun_hal::{Backend, QrunConfig};
//!
//! let config = QrunConfig::load(None)?;
//! let backend: Arc<dyn Backend> = Arc::new(QCloudBackend::from_config(&config.backend)?);
//! ```

mod api;
mod backend;
mod error;
pub mod originir;

pub use api::BASE_URL;
pub use backend::{Machine, QCloudBackend};
pub use error::{QCloudError, QCloudResult};

// Re-export common types for convenience.
pub use qrun_hal::{Backend, BackendConfig};
