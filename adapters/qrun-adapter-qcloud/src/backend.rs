//! QCloud backend implementation.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use qrun_compile::{CouplingMap, DecomposedCircuit, NativeGateSet};
use qrun_hal::{
    Backend, BackendConfig, Capabilities, Counts, Credential, ExecutionResult, HalError,
    HalResult, JobId, JobStatus,
};
use qrun_ir::ClbitId;

use crate::api::{QCloudClient, TaskRequest, TaskResponse, TaskState};
use crate::error::{QCloudError, QCloudResult};
use crate::originir::{self, ORIGINIR_GATES};

/// Maximum number of cached task entries before evicting finished ones.
const MAX_CACHED_TASKS: usize = 10_000;

/// A QCloud execution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    /// The 72-qubit superconducting chip: 6x12 grid, RZ/RX/RY + CZ.
    Origin72,
    /// The full-amplitude cloud simulator: all-to-all, OriginIR gate set.
    FullAmplitude,
}

impl Machine {
    /// Selector string used in configuration and task requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Machine::Origin72 => "origin_72",
            Machine::FullAmplitude => "full_amplitude",
        }
    }

    /// Per-task shot maximum.
    pub fn max_shots(&self) -> u32 {
        match self {
            Machine::Origin72 => 10_000,
            Machine::FullAmplitude => 100_000,
        }
    }

    /// Capabilities of this machine.
    pub fn capabilities(&self) -> QCloudResult<Capabilities> {
        let caps = match self {
            Machine::Origin72 => Capabilities::new(
                self.as_str(),
                CouplingMap::grid(6, 12),
                NativeGateSet::origin(),
                self.max_shots(),
            ),
            Machine::FullAmplitude => {
                let gates = NativeGateSet::from_names(ORIGINIR_GATES.iter().copied())
                    .map_err(|e| QCloudError::UnsupportedGate(e.to_string()))?;
                Capabilities::new(self.as_str(), CouplingMap::full(32), gates, self.max_shots())
                    .with_simulator(true)
            }
        };
        Ok(caps)
    }
}

impl FromStr for Machine {
    type Err = QCloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "origin_72" | "origin72" => Ok(Machine::Origin72),
            "full_amplitude" | "fullamplitude" => Ok(Machine::FullAmplitude),
            _ => Err(QCloudError::UnknownMachine(s.to_string())),
        }
    }
}

impl std::fmt::Display for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the backend remembers about a submitted task.
struct CachedTask {
    shots: u32,
    measured: Vec<ClbitId>,
    num_clbits: u32,
    submitted_at: DateTime<Utc>,
    result: Option<ExecutionResult>,
}

/// Origin QCloud backend.
///
/// # Example
///
/// ```ignore
/// use qrun_adapter_qcloud::{Machine, QCloudBackend};
/// use qrun_hal::Credential;
///
/// let backend = QCloudBackend::new(Machine::Origin72, Credential::from_env("API_KEY")?)?;
/// ```
pub struct QCloudBackend {
    client: QCloudClient,
    machine: Machine,
    capabilities: Capabilities,
    tasks: Arc<Mutex<FxHashMap<String, CachedTask>>>,
}

impl QCloudBackend {
    /// Create a backend against the production endpoint.
    pub fn new(machine: Machine, credential: Credential) -> QCloudResult<Self> {
        Self::from_client(machine, QCloudClient::new(credential)?)
    }

    /// Create a backend against a custom endpoint.
    pub fn with_endpoint(
        machine: Machine,
        credential: Credential,
        endpoint: impl Into<String>,
    ) -> QCloudResult<Self> {
        Self::from_client(machine, QCloudClient::with_base_url(endpoint, credential)?)
    }

    /// Create a backend from configuration, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &BackendConfig) -> QCloudResult<Self> {
        let machine: Machine = config.backend.parse()?;
        let credential = Credential::from_env(&config.credential_var)
            .map_err(|e| QCloudError::MissingCredential(e.to_string()))?;

        let mut backend = match &config.endpoint {
            Some(endpoint) => Self::with_endpoint(machine, credential, endpoint.as_str())?,
            None => Self::new(machine, credential)?,
        };
        if let Some(max_shots) = config.max_shots {
            backend.capabilities.max_shots = max_shots;
        }
        Ok(backend)
    }

    fn from_client(machine: Machine, client: QCloudClient) -> QCloudResult<Self> {
        Ok(Self {
            client,
            machine,
            capabilities: machine.capabilities()?,
            tasks: Arc::new(Mutex::new(FxHashMap::default())),
        })
    }

    /// The target machine.
    pub fn machine(&self) -> Machine {
        self.machine
    }

    async fn fetch(&self, job_id: &JobId) -> HalResult<TaskResponse> {
        Ok(self.client.get_task(&job_id.0).await?)
    }

    async fn store_result(&self, job_id: &JobId, response: &TaskResponse) -> HalResult<ExecutionResult> {
        let mut tasks = self.tasks.lock().await;
        let cached = tasks
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobFailed(format!("task {job_id} was not submitted by this backend")))?;

        if let Some(result) = &cached.result {
            return Ok(result.clone());
        }

        let counts = parse_counts(response, &cached.measured, cached.num_clbits, cached.shots)?;
        let elapsed = Utc::now()
            .signed_duration_since(cached.submitted_at)
            .num_milliseconds()
            .max(0);
        let result = ExecutionResult::new(counts, cached.shots)
            .with_execution_time(u64::try_from(elapsed).unwrap_or(0))
            .with_metadata(serde_json::json!({
                "task_id": response.task_id,
                "machine": self.machine.as_str(),
            }));
        cached.result = Some(result.clone());
        Ok(result)
    }
}

/// Convert a finished task's payload into counts over the measured bits.
fn parse_counts(
    response: &TaskResponse,
    measured: &[ClbitId],
    num_clbits: u32,
    shots: u32,
) -> QCloudResult<Counts> {
    let missing = || QCloudError::MissingResult {
        task_id: response.task_id.clone(),
        expected: "counts or probabilities".to_string(),
    };
    let result = response.result.as_ref().ok_or_else(missing)?;

    if let Some(counts) = &result.counts {
        return Ok(Counts::from_pairs(
            counts
                .iter()
                .map(|(k, &v)| (project_key(k, measured, num_clbits), v)),
        ));
    }

    if let Some(probabilities) = &result.probabilities {
        let mut merged: FxHashMap<String, f64> = FxHashMap::default();
        for (k, &p) in probabilities {
            *merged.entry(project_key(k, measured, num_clbits)).or_default() += p;
        }
        return Ok(Counts::from_probabilities(merged, shots));
    }

    Err(missing())
}

/// Reduce a key over the whole classical register to the measured bits.
///
/// The service may key results by every declared classical bit. Bit `c` of
/// such a key sits `c` places from the right; the projected key keeps the
/// measured bits in the same right-to-left order. Keys that already have one
/// character per measured bit, or that match neither shape, are returned
/// unchanged.
fn project_key(key: &str, measured: &[ClbitId], num_clbits: u32) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() == measured.len() || chars.len() != num_clbits as usize {
        return key.to_string();
    }
    measured
        .iter()
        .rev()
        .map(|c| chars[chars.len() - 1 - c.0 as usize])
        .collect()
}

/// Job status for every state but `Finished`, which needs the result stored
/// first.
fn pending_status(response: &TaskResponse) -> Option<JobStatus> {
    match response.state() {
        TaskState::Queued => Some(JobStatus::Queued),
        TaskState::Running => Some(JobStatus::Running),
        TaskState::Finished => None,
        TaskState::Failed => Some(JobStatus::Failed(response.message.clone().unwrap_or_default())),
        TaskState::Cancelled => Some(JobStatus::Cancelled),
        TaskState::Unknown => {
            warn!(task = %response.task_id, status = %response.status, "Unrecognized QCloud task status");
            Some(JobStatus::Failed(unknown_status(response)))
        }
    }
}

fn unknown_status(response: &TaskResponse) -> String {
    format!("task {} reported unknown status '{}'", response.task_id, response.status)
}

#[async_trait]
impl Backend for QCloudBackend {
    fn name(&self) -> &str {
        self.machine.as_str()
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self, circuit), fields(machine = %self.machine, circuit = circuit.name()))]
    async fn submit(&self, circuit: &DecomposedCircuit, shots: u32) -> HalResult<JobId> {
        let program = originir::emit(circuit)?;
        let qubit_num = originir::qubit_count(circuit);
        let clbit_num = circuit.num_clbits().max(1);
        info!(
            "Submitting circuit to QCloud {}: {} qubits, {} shots",
            self.machine, qubit_num, shots
        );

        let req = TaskRequest::new(self.machine.as_str(), shots, qubit_num, clbit_num, program);
        let created = self.client.create_task(&req).await?;
        let initial = created.state();
        let job_id = JobId::new(created.task_id);
        info!(
            status = created.status.as_deref().unwrap_or("unreported"),
            "QCloud task submitted: {}", job_id
        );
        if initial == Some(TaskState::Failed) {
            return Err(HalError::CircuitRejected {
                diagnostic: format!("task {job_id} failed on creation"),
            });
        }

        let mut tasks = self.tasks.lock().await;
        if tasks.len() >= MAX_CACHED_TASKS {
            tasks.retain(|_, t| t.result.is_none());
        }
        tasks.insert(
            job_id.0.clone(),
            CachedTask {
                shots,
                measured: circuit.measured_clbits(),
                num_clbits: circuit.num_clbits(),
                submitted_at: Utc::now(),
                result: None,
            },
        );

        Ok(job_id)
    }

    #[instrument(skip(self))]
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let response = self.fetch(job_id).await?;
        let status = match pending_status(&response) {
            Some(status) => status,
            None => {
                self.store_result(job_id, &response).await?;
                JobStatus::Completed
            }
        };
        debug!("QCloud task {} is {}", job_id, status);
        Ok(status)
    }

    #[instrument(skip(self))]
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        {
            let tasks = self.tasks.lock().await;
            if let Some(result) = tasks.get(&job_id.0).and_then(|t| t.result.as_ref()) {
                return Ok(result.clone());
            }
        }

        let response = self.fetch(job_id).await?;
        match response.state() {
            TaskState::Finished => self.store_result(job_id, &response).await,
            TaskState::Failed => Err(HalError::JobFailed(response.message.unwrap_or_default())),
            TaskState::Cancelled => Err(HalError::Cancelled),
            TaskState::Queued | TaskState::Running => Err(HalError::JobFailed(format!(
                "task {job_id} has not finished ({})",
                response.status
            ))),
            TaskState::Unknown => Err(HalError::JobFailed(unknown_status(&response))),
        }
    }

    #[instrument(skip(self))]
    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        info!("Cancelling QCloud task {}", job_id);
        self.client.cancel_task(&job_id.0).await?;
        Ok(())
    }

    async fn close(&self) -> HalResult<()> {
        let mut tasks = self.tasks.lock().await;
        debug!("Releasing {} cached QCloud task(s)", tasks.len());
        tasks.clear();
        Ok(())
    }
}
