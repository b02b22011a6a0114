//! Backend trait.
//!
//! The [`Backend`] trait covers the remote job lifecycle:
//!
//! ```text
//!   capabilities() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)      (async)      (async)      (async)
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `capabilities()` | sync | yes | `&Capabilities` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<ExecutionResult>` |
//! | `cancel()` | async | yes | `HalResult<()>` |
//! | `close()` | async | provided | `HalResult<()>` |
//! | `wait()` | async | provided | `HalResult<ExecutionResult>` |
//!
//! Backends do not retry. Retry, deadlines and cancellation belong to the
//! [`ExecutionClient`](crate::ExecutionClient); a backend only classifies
//! its failures through [`HalError`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use qrun_compile::DecomposedCircuit;

use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// Trait for quantum backends.
///
/// `capabilities()` must be cached at construction time. `submit()` receives
/// circuits already decomposed for those capabilities and returns a job in
/// `Queued` status.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Submit a native circuit for execution.
    async fn submit(&self, circuit: &DecomposedCircuit, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Cancel a job. Cancelling a finished job is not an error.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Release any held connection. Called once when a session ends.
    async fn close(&self) -> HalResult<()> {
        Ok(())
    }

    /// Poll a job until it reaches a terminal state and return its result.
    ///
    /// There is no built-in deadline; callers bound the wait themselves.
    async fn wait(&self, job_id: &JobId, poll_interval: Duration) -> HalResult<ExecutionResult> {
        loop {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::Cancelled),
                status @ (JobStatus::Queued | JobStatus::Running) => {
                    trace!("Job {} is {}", job_id, status);
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::result::Counts;

    struct Scripted {
        caps: Capabilities,
        statuses: Mutex<Vec<JobStatus>>,
    }

    impl Scripted {
        fn new(mut statuses: Vec<JobStatus>) -> Self {
            statuses.reverse();
            Self {
                caps: Capabilities::simulator("scripted", 2),
                statuses: Mutex::new(statuses),
            }
        }
    }

    #[async_trait]
    impl Backend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        async fn submit(&self, _: &DecomposedCircuit, _: u32) -> HalResult<JobId> {
            Ok(JobId::new("job-1"))
        }

        async fn status(&self, _: &JobId) -> HalResult<JobStatus> {
            Ok(self.statuses.lock().unwrap().pop().unwrap_or(JobStatus::Completed))
        }

        async fn result(&self, _: &JobId) -> HalResult<ExecutionResult> {
            Ok(ExecutionResult::new(Counts::from_pairs([("00", 10)]), 10))
        }

        async fn cancel(&self, _: &JobId) -> HalResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_polls_until_completed() {
        let backend = Scripted::new(vec![JobStatus::Queued, JobStatus::Running, JobStatus::Completed]);
        let result = backend
            .wait(&JobId::new("job-1"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(result.counts.get("00"), 10);
        assert!(backend.statuses.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_reports_failure() {
        let backend = Scripted::new(vec![JobStatus::Running, JobStatus::Failed("calibration".into())]);
        let err = backend
            .wait(&JobId::new("job-1"), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, HalError::JobFailed(msg) if msg == "calibration"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_reports_cancellation() {
        let backend = Scripted::new(vec![JobStatus::Cancelled]);
        let err = backend
            .wait(&JobId::new("job-1"), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, HalError::Cancelled));
    }

    #[tokio::test]
    async fn test_default_close_is_ok() {
        assert!(Scripted::new(vec![]).close().await.is_ok());
    }
}
