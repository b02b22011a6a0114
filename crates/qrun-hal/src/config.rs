//! Execution and backend configuration.
//!
//! Values are layered, highest precedence first:
//! 1. Environment variables (`QRUN_` prefix)
//! 2. Configuration file (YAML)
//! 3. Default values
//!
//! `.env` loading is left to the binary; this module only reads what is
//! already in the process environment.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_CREDENTIAL_VAR;
use crate::error::{HalError, HalResult};
use crate::result::ValidationMode;

/// Retry, deadline and validation policy of the execution client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Total attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound on any single retry delay in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Deadline for one attempt (submit plus wait) in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between status polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How strictly returned shot totals are checked.
    #[serde(default)]
    pub validation: ValidationMode,
}

/// Which backend to talk to and how to size circuits for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend selector, e.g. `origin_72` or `full_amplitude`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Service endpoint; adapters fall back to their own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_credential_var")]
    pub credential_var: String,

    /// Qubit pool size for circuit builders.
    #[serde(default = "default_pool")]
    pub qubit_pool: u32,

    /// Classical bit pool size for circuit builders.
    #[serde(default = "default_pool")]
    pub clbit_pool: u32,

    /// Override of the backend's per-job shot maximum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_shots: Option<u32>,
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrunConfig {
    /// Execution client policy.
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Backend selection.
    #[serde(default)]
    pub backend: BackendConfig,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_backend() -> String {
    "origin_72".to_string()
}

fn default_credential_var() -> String {
    DEFAULT_CREDENTIAL_VAR.to_string()
}

fn default_pool() -> u32 {
    72
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            validation: ValidationMode::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: None,
            credential_var: default_credential_var(),
            qubit_pool: default_pool(),
            clbit_pool: default_pool(),
            max_shots: None,
        }
    }
}

impl ExecutionConfig {
    /// Set the attempt bound.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the initial and maximum retry delays.
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff_ms = duration_ms(initial);
        self.max_backoff_ms = duration_ms(max);
        self
    }

    /// Set the per-attempt deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Set the status poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = duration_ms(interval);
        self
    }

    /// Set the validation mode.
    #[must_use]
    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    /// Delay before retry number `retry` (1-based): `initial * 2^(retry-1)`,
    /// capped at the maximum.
    pub fn backoff(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(32);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between status polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> HalResult<()> {
        if self.max_attempts == 0 {
            return Err(HalError::Configuration(
                "max_attempts must be greater than 0".to_string(),
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(HalError::Configuration(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        if self.timeout_secs == 0 {
            return Err(HalError::Configuration(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(HalError::Configuration(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl BackendConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> HalResult<()> {
        if self.backend.trim().is_empty() {
            return Err(HalError::Configuration("backend must not be empty".to_string()));
        }
        if self.credential_var.trim().is_empty() {
            return Err(HalError::Configuration(
                "credential_var must not be empty".to_string(),
            ));
        }
        if self.qubit_pool == 0 || self.clbit_pool == 0 {
            return Err(HalError::Configuration(
                "qubit_pool and clbit_pool must be greater than 0".to_string(),
            ));
        }
        if self.max_shots == Some(0) {
            return Err(HalError::Configuration(
                "max_shots must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl QrunConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> HalResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HalError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> HalResult<Self> {
        serde_yaml_ng::from_str(contents)
            .map_err(|e| HalError::Configuration(format!("invalid configuration: {e}")))
    }

    /// Load configuration: file (if given) or defaults, then environment
    /// overrides, then validation.
    pub fn load(config_file: Option<&Path>) -> HalResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QRUN_*` overrides from the process environment.
    pub fn merge_env(self) -> HalResult<Self> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `QRUN_*` overrides from an arbitrary lookup.
    ///
    /// Only variables that are present override; unparsable values are a
    /// configuration error.
    pub fn merge_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> HalResult<Self> {
        let exec = &mut self.execution;
        override_parsed(&lookup, "QRUN_MAX_ATTEMPTS", &mut exec.max_attempts)?;
        override_parsed(&lookup, "QRUN_INITIAL_BACKOFF_MS", &mut exec.initial_backoff_ms)?;
        override_parsed(&lookup, "QRUN_MAX_BACKOFF_MS", &mut exec.max_backoff_ms)?;
        override_parsed(&lookup, "QRUN_TIMEOUT_SECS", &mut exec.timeout_secs)?;
        override_parsed(&lookup, "QRUN_POLL_INTERVAL_MS", &mut exec.poll_interval_ms)?;
        if let Some(v) = lookup("QRUN_VALIDATION") {
            exec.validation = match v.trim().to_ascii_lowercase().as_str() {
                "lenient" => ValidationMode::Lenient,
                "strict" => ValidationMode::Strict,
                other => {
                    return Err(HalError::Configuration(format!(
                        "QRUN_VALIDATION: expected 'lenient' or 'strict', got '{other}'"
                    )));
                }
            };
        }

        let backend = &mut self.backend;
        override_parsed(&lookup, "QRUN_QUBIT_POOL", &mut backend.qubit_pool)?;
        override_parsed(&lookup, "QRUN_CLBIT_POOL", &mut backend.clbit_pool)?;
        if let Some(v) = lookup("QRUN_BACKEND") {
            backend.backend = v;
        }
        if let Some(v) = lookup("QRUN_ENDPOINT") {
            backend.endpoint = Some(v);
        }
        if let Some(v) = lookup("QRUN_CREDENTIAL_VAR") {
            backend.credential_var = v;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> HalResult<()> {
        self.execution.validate()?;
        self.backend.validate()
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) -> HalResult<()>
where
    T::Err: std::fmt::Display,
{
    if let Some(v) = lookup(key) {
        *slot = v
            .trim()
            .parse()
            .map_err(|e| HalError::Configuration(format!("{key}={v}: {e}")))?;
    }
    Ok(())
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = QrunConfig::default();
        assert_eq!(config.execution.max_attempts, 3);
        assert_eq!(config.execution.timeout(), Duration::from_secs(600));
        assert_eq!(config.execution.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.backend.backend, "origin_72");
        assert_eq!(config.backend.credential_var, "API_KEY");
        assert_eq!(config.backend.qubit_pool, 72);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = ExecutionConfig::default()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(400));
        assert_eq!(config.backoff(4), Duration::from_millis(500));
        assert_eq!(config.backoff(100), Duration::from_millis(500));
    }

    #[test]
    fn test_yaml_with_partial_fields() {
        let yaml = "execution:\n  max_attempts: 5\n  validation: strict\nbackend:\n  backend: full_amplitude\n  qubit_pool: 24\n";
        let config = QrunConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.execution.max_attempts, 5);
        assert_eq!(config.execution.validation, ValidationMode::Strict);
        assert_eq!(config.execution.initial_backoff_ms, 1000);
        assert_eq!(config.backend.backend, "full_amplitude");
        assert_eq!(config.backend.qubit_pool, 24);
        assert_eq!(config.backend.clbit_pool, 72);
    }

    #[test]
    fn test_env_overrides_file() {
        let config = QrunConfig::from_yaml("execution:\n  max_attempts: 5\n")
            .unwrap()
            .merge_env_from(env(&[
                ("QRUN_MAX_ATTEMPTS", "7"),
                ("QRUN_BACKEND", "full_amplitude"),
                ("QRUN_ENDPOINT", "https://example.test"),
                ("QRUN_VALIDATION", "Strict"),
            ]))
            .unwrap();
        assert_eq!(config.execution.max_attempts, 7);
        assert_eq!(config.execution.validation, ValidationMode::Strict);
        assert_eq!(config.backend.backend, "full_amplitude");
        assert_eq!(config.backend.endpoint.as_deref(), Some("https://example.test"));
    }

    #[test]
    fn test_unparsable_env_is_an_error() {
        let err = QrunConfig::default()
            .merge_env_from(env(&[("QRUN_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("QRUN_TIMEOUT_SECS"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = QrunConfig::default();
        config.execution.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = QrunConfig::default();
        config.execution.initial_backoff_ms = 60_000;
        assert!(config.validate().is_err());

        let mut config = QrunConfig::default();
        config.backend.max_shots = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            QrunConfig::from_yaml("execution: [1, 2"),
            Err(HalError::Configuration(_))
        ));
    }
}
