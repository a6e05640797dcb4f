// ABOUTME: Finalizer for runs that end abnormally.
// ABOUTME: Records failed/interrupted with the exit code and removes the run marker.

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::Result;
use crate::marker::RunMarker;
use crate::state::{DeploymentState, StateKind, StateStore};

/// Owns only paths, so it outlives the orchestrator future it finalizes.
#[derive(Debug, Clone)]
pub struct Finalizer {
    store: StateStore,
    marker: PathBuf,
    deployment_id: String,
}

impl Finalizer {
    pub fn new(settings: &Settings, deployment_id: &str) -> Self {
        Self {
            store: StateStore::new(&settings.state_file),
            marker: settings.pid_file.clone(),
            deployment_id: deployment_id.to_string(),
        }
    }

    /// Record `failed`/`interrupted` and remove the run marker. The marker is
    /// removed even when the record cannot be written.
    pub fn interrupted(&self, exit_code: i32) -> Result<()> {
        tracing::warn!(exit_code, "Run terminated abnormally");
        let state = DeploymentState::new(StateKind::Failed, &self.deployment_id)
            .with("status", "interrupted")
            .with("exit_code", exit_code);
        let recorded = self.store.save(&state);
        self.release()?;
        recorded
    }

    /// Remove the run marker after a normal end.
    pub fn release(&self) -> Result<()> {
        RunMarker::remove_at(&self.marker)
    }
}
