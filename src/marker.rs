// ABOUTME: Run marker file identifying the invocation currently in progress.
// ABOUTME: Informational only; it is overwritten by a new run and never used for exclusion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Who is running, recorded for an operator inspecting the project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    /// Hostname of the machine running the orchestrator.
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub deployment_id: String,
}

impl RunInfo {
    /// Run info for the current process.
    pub fn new(deployment_id: &str) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            deployment_id: deployment_id.to_string(),
        }
    }
}

/// A written run marker. Call [`RunMarker::remove`] when the run ends.
#[derive(Debug)]
pub struct RunMarker {
    path: PathBuf,
}

impl RunMarker {
    /// Write the marker, replacing whatever a previous run left behind.
    pub fn create(path: &Path, deployment_id: &str) -> Result<Self> {
        if let Some(previous) = Self::read(path) {
            tracing::warn!(
                "Replacing run marker left by {} (pid {}) since {}",
                previous.holder,
                previous.pid,
                previous.started_at
            );
        }

        let info = RunInfo::new(deployment_id);
        std::fs::write(path, serde_json::to_string(&info)?)?;
        tracing::debug!("Run marker written to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Read a marker, ignoring missing or unparsable files.
    pub fn read(path: &Path) -> Option<RunInfo> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a marker by path. A missing marker is not an error.
    pub fn remove_at(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
