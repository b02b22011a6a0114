//! Scoped backend sessions.
//!
//! A [`Session`] owns the backend handle for the duration of a run. Use
//! [`Session::scope`] so the handle is released on every exit path.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::config::ExecutionConfig;
use crate::error::HalResult;
use crate::executor::{CancelHandle, ExecutionClient, ExecutionRequest};
use crate::result::ExecutionResult;

/// An open connection to one backend, with its execution client.
pub struct Session {
    client: ExecutionClient,
    closed: bool,
}

impl Session {
    /// Open a session on a backend.
    pub fn open(backend: Arc<dyn Backend>, config: ExecutionConfig) -> HalResult<Self> {
        config.validate()?;
        info!(
            backend = backend.name(),
            qubits = backend.capabilities().num_qubits,
            max_attempts = config.max_attempts,
            "Session opened"
        );
        Ok(Self {
            client: ExecutionClient::new(backend, config),
            closed: false,
        })
    }

    /// Run `body` inside a session that is closed afterwards, whatever the
    /// outcome.
    ///
    /// If `body` fails, its error is returned and a close failure is only
    /// logged. If `body` succeeds, a close failure is returned. Dropping the
    /// returned future mid-run closes the backend in the background; use a
    /// [`CancelHandle`] to also cancel the remote job.
    pub async fn scope<T, F>(backend: Arc<dyn Backend>, config: ExecutionConfig, body: F) -> HalResult<T>
    where
        F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, HalResult<T>>,
    {
        let session = Self::open(backend, config)?;
        let outcome = body(&session).await;
        let closed = session.close().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!(error = %close_err, "Failed to close session after error");
                Err(e)
            }
        }
    }

    /// The backend of this session.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.client.backend()
    }

    /// The execution client of this session.
    pub fn client(&self) -> &ExecutionClient {
        &self.client
    }

    /// A handle that cancels submissions made through this session.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.client.cancel_handle()
    }

    /// Submit a request through this session's client.
    pub async fn submit(&self, request: &ExecutionRequest) -> HalResult<ExecutionResult> {
        self.client.submit(request).await
    }

    /// Release the backend connection.
    pub async fn close(mut self) -> HalResult<()> {
        self.closed = true;
        let backend = self.client.backend();
        let result = backend.close().await;
        match &result {
            Ok(()) => info!(backend = backend.name(), "Session closed"),
            Err(e) => warn!(backend = backend.name(), error = %e, "Session close failed"),
        }
        result
    }
}

impl Drop for Session {
    /// An unclosed session starts a detached close on the current runtime,
    /// which covers a [`Session::scope`] future abandoned mid-run. Outside a
    /// runtime the backend is left as is.
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let backend = self.client.backend().clone();
        warn!(backend = backend.name(), "Session dropped without close");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match backend.close().await {
                        Ok(()) => info!(backend = backend.name(), "Dropped session closed"),
                        Err(e) => {
                            warn!(backend = backend.name(), error = %e, "Dropped session close failed")
                        }
                    }
                });
            }
            Err(_) => warn!(backend = backend.name(), "No runtime to close dropped session"),
        }
    }
}
