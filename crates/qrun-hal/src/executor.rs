//! Execution client: preflight checks, bounded retry, deadlines and
//! cancellation around a [`Backend`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

use qrun_compile::DecomposedCircuit;

use crate::backend::Backend;
use crate::config::ExecutionConfig;
use crate::error::{HalError, HalResult};
use crate::job::JobId;
use crate::result::{ExecutionResult, validate};

/// One submission: a native circuit, a shot count and the backend it was
/// decomposed for.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Circuit decomposed for `backend`.
    pub circuit: DecomposedCircuit,
    /// Number of shots.
    pub shots: u32,
    /// Name of the backend the circuit targets.
    pub backend: String,
}

impl ExecutionRequest {
    /// Create a request.
    pub fn new(circuit: DecomposedCircuit, shots: u32, backend: impl Into<String>) -> Self {
        Self {
            circuit,
            shots,
            backend: backend.into(),
        }
    }
}

/// Cancels the submissions of the [`ExecutionClient`] it came from.
///
/// Cancellation is sticky: once cancelled, later submissions on the same
/// client fail with [`HalError::Cancelled`] immediately.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Submits decomposed circuits to a backend and returns validated results.
pub struct ExecutionClient {
    backend: Arc<dyn Backend>,
    config: ExecutionConfig,
    cancel: Arc<watch::Sender<bool>>,
}

impl ExecutionClient {
    /// Create a client around a backend.
    pub fn new(backend: Arc<dyn Backend>, config: ExecutionConfig) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            backend,
            config,
            cancel: Arc::new(tx),
        }
    }

    /// The backend this client submits to.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// The retry and deadline policy.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// A handle that cancels this client's submissions.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    /// Submit a request and wait for its validated result.
    ///
    /// Transient failures and per-attempt timeouts are retried with
    /// exponential backoff up to `max_attempts`, then reported as
    /// [`HalError::BackendUnreachable`]. Every other error is returned as
    /// is, without retry.
    #[instrument(skip(self, request), fields(backend = %request.backend, circuit = request.circuit.name(), shots = request.shots))]
    pub async fn submit(&self, request: &ExecutionRequest) -> HalResult<ExecutionResult> {
        self.preflight(request)?;

        let mut cancel_rx = self.cancel.subscribe();
        if *cancel_rx.borrow() {
            return Err(HalError::Cancelled);
        }

        let started = chrono::Utc::now();
        let max_attempts = self.config.max_attempts;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let backoff = self.config.backoff(attempt - 1);
                warn!(
                    attempt,
                    max_attempts,
                    error = %last_error,
                    "Retrying after transient failure (backoff {:?})",
                    backoff
                );
                tokio::select! {
                    biased;
                    () = cancelled(&mut cancel_rx) => {
                        info!("Cancelled during backoff");
                        return Err(HalError::Cancelled);
                    }
                    () = tokio::time::sleep(backoff) => {}
                }
            }

            match self.attempt(request, &mut cancel_rx).await {
                Ok(mut result) => {
                    validate(
                        &result,
                        request.circuit.measured_clbits().len(),
                        request.shots,
                        self.config.validation,
                    )?;
                    if result.execution_time_ms.is_none() {
                        let elapsed = chrono::Utc::now()
                            .signed_duration_since(started)
                            .num_milliseconds()
                            .max(0);
                        result.execution_time_ms = u64::try_from(elapsed).ok();
                    }
                    info!(attempt, outcomes = result.counts.len(), "Execution completed");
                    return Ok(result);
                }
                Err(e) if e.is_transient() => {
                    warn!(attempt, error = %e, "Transient failure");
                    last_error = e.to_string();
                }
                Err(e) => return Err(e),
            }
        }

        Err(HalError::BackendUnreachable {
            attempts: max_attempts,
            last_error,
        })
    }

    fn preflight(&self, request: &ExecutionRequest) -> HalResult<()> {
        if request.shots == 0 {
            return Err(HalError::InvalidShots("shots must be at least 1".to_string()));
        }

        let caps = self.backend.capabilities();
        if request.shots > caps.max_shots {
            return Err(HalError::ShotCountExceeded {
                requested: request.shots,
                max: caps.max_shots,
            });
        }

        let circuit = &request.circuit;
        let required = circuit
            .used_physical_qubits()
            .last()
            .map_or(0, |q| q + 1)
            .max(circuit.num_logical_qubits());
        if required > caps.num_qubits {
            return Err(HalError::CircuitTooLarge {
                required,
                available: caps.num_qubits,
            });
        }

        if request.backend != self.backend.name() {
            return Err(HalError::Configuration(format!(
                "request targets '{}' but the client is bound to '{}'",
                request.backend,
                self.backend.name()
            )));
        }

        circuit
            .verify(&caps.coupling_map, &caps.native_gates)
            .map_err(|e| HalError::InvalidCircuit(e.to_string()))
    }

    /// One submit-and-wait under a single deadline.
    async fn attempt(
        &self,
        request: &ExecutionRequest,
        cancel_rx: &mut watch::Receiver<bool>,
    ) -> HalResult<ExecutionResult> {
        let timeout = self.config.timeout();
        let deadline = Instant::now() + timeout;

        let submitted = tokio::select! {
            biased;
            () = cancelled(cancel_rx) => return Err(HalError::Cancelled),
            r = timeout_at(deadline, self.backend.submit(&request.circuit, request.shots)) => r,
        };
        let job_id = match submitted {
            Ok(job_id) => job_id?,
            Err(_) => {
                return Err(HalError::Timeout(format!(
                    "submission did not complete within {timeout:?}"
                )));
            }
        };
        debug!(job_id = %job_id, "Job submitted");

        let outcome = tokio::select! {
            biased;
            () = cancelled(cancel_rx) => Err(HalError::Cancelled),
            r = timeout_at(deadline, self.backend.wait(&job_id, self.config.poll_interval())) => {
                r.unwrap_or_else(|_| {
                    Err(HalError::Timeout(format!("job {job_id} did not finish within {timeout:?}")))
                })
            }
        };

        // Any failure short of a finished job leaves it possibly live remotely.
        let live = matches!(
            &outcome,
            Err(e) if !matches!(e, HalError::JobFailed(_) | HalError::MalformedResult { .. })
        );
        if live {
            self.cancel_remote(&job_id).await;
        }
        outcome
    }

    async fn cancel_remote(&self, job_id: &JobId) {
        match self.backend.cancel(job_id).await {
            Ok(()) => debug!(job_id = %job_id, "Remote job cancelled"),
            Err(e) => warn!(job_id = %job_id, error = %e, "Failed to cancel remote job"),
        }
    }
}

/// Resolves once cancellation is requested; never resolves if the sender
/// is gone.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|c| *c).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
