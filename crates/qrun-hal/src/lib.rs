//! qrun hardware abstraction layer
//!
//! This crate connects decomposed circuits to remote quantum backends:
//!
//! - [`Backend`]: the async job lifecycle a provider adapter implements
//! - [`Session`]: a scoped backend handle, closed on every exit path
//! - [`ExecutionClient`]: preflight checks, bounded retry with exponential
//!   backoff, per-attempt deadlines and cancellation
//! - [`result`]: counts, validation and bitstring decoding
//! - [`QrunConfig`]: layered configuration (defaults, YAML file, `QRUN_*`
//!   environment variables)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use futures::FutureExt;
//! use qrun_hal::{Backend, ExecutionConfig, ExecutionRequest, HalResult, Session};
//! use qrun_ir::Circuit;
//!
//! async fn run(backend: Arc<dyn Backend>) -> HalResult<()> {
//!     let circuit = Circuit::bell()?;
//!     let decomposed = backend.capabilities().decomposer().decompose(&circuit)?;
//!     let request = ExecutionRequest::new(decomposed, 1000, backend.name());
//!
//!     let result = Session::scope(backend, ExecutionConfig::default(), |session| {
//!         async move { session.submit(&request).await }.boxed()
//!     })
//!     .await?;
//!
//!     for (bits, count) in result.counts.sorted() {
//!         println!("{bits}: {count}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Bit order
//!
//! Result keys hold one character per measured classical bit; the rightmost
//! character is the lowest classical bit. [`to_integer`] with
//! [`BitOrder::MsbFirst`] therefore maps classical bit `i` to the `2^i`
//! place.

pub mod auth;
pub mod backend;
pub mod capability;
pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod result;
pub mod session;

pub use auth::{Credential, DEFAULT_CREDENTIAL_VAR};
pub use backend::Backend;
pub use capability::Capabilities;
pub use config::{BackendConfig, ExecutionConfig, QrunConfig};
pub use error::{HalError, HalResult};
pub use executor::{CancelHandle, ExecutionClient, ExecutionRequest};
pub use job::{JobId, JobStatus};
pub use result::{
    BitOrder, Counts, ExecutionResult, ValidationMode, to_distribution, to_integer,
    to_integer_counts, validate,
};
pub use session::Session;
