// ABOUTME: Persisted deployment state record.
// ABOUTME: A single JSON object, overwritten after each terminal phase and deleted on cleanup.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Recorded lifecycle label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Deployed,
    Validated,
    Failed,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Deployed => "deployed",
            StateKind::Validated => "validated",
            StateKind::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Phase tag stored under `data.phase` when a run fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Deployment,
    Validation,
    PostConfig,
    Cleanup,
    HealthCheck,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Deployment => "deployment",
            Phase::Validation => "validation",
            Phase::PostConfig => "post_config",
            Phase::Cleanup => "cleanup",
            Phase::HealthCheck => "health_check",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate a run identifier from the local wall clock.
pub fn new_deployment_id() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub timestamp: DateTime<Utc>,
    pub state: StateKind,
    pub deployment_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl DeploymentState {
    pub fn new(state: StateKind, deployment_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            state,
            deployment_id: deployment_id.into(),
            data: Map::new(),
        }
    }

    /// Add a key to the free-form payload.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// A failure record tagged with the phase that failed.
    pub fn failed(deployment_id: impl Into<String>, phase: Phase, exit_code: Option<i32>) -> Self {
        Self::new(StateKind::Failed, deployment_id)
            .with("status", "failed")
            .with("phase", phase.as_str())
            .with("exit_code", exit_code)
    }

    /// Render a payload value for display.
    pub fn data_str(&self, key: &str) -> Option<String> {
        self.data.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn phase(&self) -> Option<&str> {
        self.data.get("phase").and_then(Value::as_str)
    }
}

/// Reads and writes the single state record on disk.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current record. A missing file is `None`.
    pub fn load(&self) -> Result<Option<DeploymentState>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the current record.
    pub fn save(&self, state: &DeploymentState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::info!(
            state = %state.state,
            deployment_id = %state.deployment_id,
            "State recorded"
        );
        Ok(())
    }

    /// Delete the record. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("State record removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
