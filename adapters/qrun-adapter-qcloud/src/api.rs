//! QCloud REST API client.
//!
//! Tasks are created with `POST /tasks`, polled with `GET /tasks/{id}` and
//! cancelled with `DELETE /tasks/{id}`. Every request carries the API key as
//! a Bearer token.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use qrun_hal::Credential;

use crate::error::{QCloudError, QCloudResult};

/// QCloud API base URL.
pub const BASE_URL: &str = "https://qcloud.originqc.com.cn/api/v1";

/// QCloud REST API client.
pub struct QCloudClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl std::fmt::Debug for QCloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QCloudClient")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish()
    }
}

impl QCloudClient {
    /// Create a client against the production endpoint.
    pub fn new(credential: Credential) -> QCloudResult<Self> {
        Self::with_base_url(BASE_URL, credential)
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, credential: Credential) -> QCloudResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(QCloudError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// The base URL requests go to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.credential.expose())
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> QCloudResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        handle_response(resp).await
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> QCloudResult<T> {
        let url = self.url(path);
        debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(body)
            .send()
            .await?;

        handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> QCloudResult<()> {
        let url = self.url(path);
        debug!("DELETE {}", url);

        let resp = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let status = resp.status();
        // 409: the task already reached a terminal state.
        if status.is_success() || status == StatusCode::CONFLICT {
            Ok(())
        } else {
            let message = resp.text().await.unwrap_or_default();
            Err(api_error(status, message))
        }
    }

    /// Create a task.
    #[instrument(skip(self, req), fields(machine = req.machine, shots = req.shots))]
    pub async fn create_task(&self, req: &TaskRequest) -> QCloudResult<TaskCreated> {
        self.post("tasks", req).await
    }

    /// Fetch status and, once finished, the result of a task.
    #[instrument(skip(self))]
    pub async fn get_task(&self, task_id: &str) -> QCloudResult<TaskResponse> {
        self.get(&format!("tasks/{task_id}")).await
    }

    /// Cancel a queued or running task.
    #[instrument(skip(self))]
    pub async fn cancel_task(&self, task_id: &str) -> QCloudResult<()> {
        self.delete(&format!("tasks/{task_id}")).await
    }
}

async fn handle_response<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> QCloudResult<T> {
    let status = response.status();
    if status.is_success() {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(api_error(status, message))
    }
}

fn api_error(status: StatusCode, message: String) -> QCloudError {
    if status == StatusCode::NOT_FOUND {
        QCloudError::TaskNotFound(message)
    } else {
        QCloudError::ApiError {
            status: status.as_u16(),
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response serde types
// ---------------------------------------------------------------------------

/// Request body for `POST /tasks`.
#[derive(Debug, Serialize)]
pub struct TaskRequest {
    /// Machine selector, e.g. `origin_72`.
    pub machine: &'static str,
    /// Number of shots.
    pub shots: u32,
    /// Qubits declared by the program.
    pub qubit_num: u32,
    /// Classical bits declared by the program.
    pub clbit_num: u32,
    /// OriginIR program text.
    pub program: String,
    /// Client-side label.
    pub label: String,
}

impl TaskRequest {
    /// Create a request with a fresh label.
    pub fn new(machine: &'static str, shots: u32, qubit_num: u32, clbit_num: u32, program: String) -> Self {
        Self {
            machine,
            shots,
            qubit_num,
            clbit_num,
            program,
            label: format!("qrun-{}", uuid::Uuid::new_v4()),
        }
    }
}

/// Response from `POST /tasks`.
#[derive(Debug, Deserialize)]
pub struct TaskCreated {
    /// Assigned task identifier.
    pub task_id: String,
    /// Initial status, if reported.
    #[serde(default)]
    pub status: Option<String>,
}

/// Response from `GET /tasks/{id}`.
#[derive(Debug, Deserialize)]
pub struct TaskResponse {
    /// Task identifier.
    pub task_id: String,
    /// `queued | running | finished | failed | cancelled`.
    pub status: String,
    /// Error message when `status == "failed"`.
    #[serde(default)]
    pub message: Option<String>,
    /// Measurement outcome when `status == "finished"`.
    #[serde(default)]
    pub result: Option<TaskResult>,
}

/// Measurement outcome of a finished task, keyed by bitstring.
#[derive(Debug, Deserialize, Default)]
pub struct TaskResult {
    /// Raw counts, if the machine reports them.
    #[serde(default)]
    pub counts: Option<HashMap<String, u64>>,
    /// Probabilities, as reported by the real chip.
    #[serde(default)]
    pub probabilities: Option<HashMap<String, f64>>,
}

/// Task lifecycle as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Running,
    Finished,
    Failed,
    Cancelled,
    /// A status string this client does not recognize.
    Unknown,
}

impl TaskState {
    /// Parse a status string, case-insensitively.
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "queued" | "waiting" | "pending" => TaskState::Queued,
            "running" | "computing" => TaskState::Running,
            "finished" | "completed" | "success" => TaskState::Finished,
            "failed" | "error" => TaskState::Failed,
            "cancelled" | "canceled" => TaskState::Cancelled,
            _ => TaskState::Unknown,
        }
    }
}

impl TaskCreated {
    /// The initial state, if the service reported one.
    pub fn state(&self) -> Option<TaskState> {
        self.status.as_deref().map(TaskState::parse)
    }
}

impl TaskResponse {
    /// Parse the status string.
    pub fn state(&self) -> TaskState {
        TaskState::parse(&self.status)
    }
}
