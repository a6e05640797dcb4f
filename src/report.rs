// ABOUTME: Validation report discovery and the deployment summary.
// ABOUTME: Picks the newest JSON report by mtime; absent fields render as N/A.

use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::Result;
use crate::state::DeploymentState;

/// Placeholder for any value the report or state does not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Status string the validation playbook writes for a healthy cluster.
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// A parsed validation report.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    path: PathBuf,
    body: Value,
}

impl ValidationReport {
    pub fn from_json(path: impl Into<PathBuf>, json: &str) -> Result<Self> {
        Ok(Self {
            path: path.into(),
            body: serde_json::from_str(json)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(path, &content)
    }

    /// Newest `*.json` report in `dir` by modification time. A missing directory is `None`.
    pub fn latest_path(dir: &Path) -> Result<Option<PathBuf>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified()?;
            if newest.as_ref().is_none_or(|(best, _)| modified > *best) {
                newest = Some((modified, path));
            }
        }

        Ok(newest.map(|(_, path)| path))
    }

    /// Load the newest report in `dir`, if any.
    pub fn latest(dir: &Path) -> Result<Option<Self>> {
        match Self::latest_path(dir)? {
            Some(path) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// HTML rendering written alongside the JSON, when present.
    pub fn html_companion(&self) -> Option<PathBuf> {
        let html = self.path.with_extension("html");
        html.is_file().then_some(html)
    }

    /// Value at a JSON pointer such as `/results/phase1/status`, or N/A.
    pub fn field(&self, pointer: &str) -> String {
        self.body
            .pointer(pointer)
            .map(render)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn status(&self) -> String {
        self.field("/status")
    }

    pub fn health_score(&self) -> String {
        self.field("/health_score")
    }

    /// Raw health score for storing in the state record. Missing or null is N/A.
    pub fn health_score_value(&self) -> Value {
        match self.body.get("health_score") {
            Some(Value::Null) | None => Value::String(NOT_AVAILABLE.to_string()),
            Some(score) => score.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == STATUS_SUCCESS
    }

    /// `(phaseN, status)` pairs from `results`, in phase order.
    pub fn phases(&self) -> Vec<(String, String)> {
        let Some(results) = self.body.get("results").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut phases: Vec<(String, String)> = results
            .iter()
            .filter(|(name, _)| name.starts_with("phase"))
            .map(|(name, result)| {
                let status = result
                    .get("status")
                    .map(render)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                (name.clone(), status)
            })
            .collect();
        phases.sort_by_key(|(name, _)| phase_number(name));
        phases
    }
}

fn phase_number(name: &str) -> (u32, String) {
    let number = name
        .trim_start_matches("phase")
        .parse::<u32>()
        .unwrap_or(u32::MAX);
    (number, name.to_string())
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read-only view over the state record and the newest report.
#[derive(Debug, Default)]
pub struct Summary {
    pub state: Option<DeploymentState>,
    pub report: Option<ValidationReport>,
}

impl Summary {
    pub fn new(state: Option<DeploymentState>, report: Option<ValidationReport>) -> Self {
        Self { state, report }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let na = || NOT_AVAILABLE.to_string();

        let (state, id, updated) = match self.state {
            Some(ref s) => (
                s.state.to_string(),
                s.deployment_id.clone(),
                s.timestamp.to_rfc3339(),
            ),
            None => ("unknown".to_string(), na(), na()),
        };
        writeln!(f, "  State:          {state}")?;
        writeln!(f, "  Deployment ID:  {id}")?;
        writeln!(f, "  Updated:        {updated}")?;

        if let Some(phase) = self.state.as_ref().and_then(|s| s.phase()) {
            writeln!(f, "  Failed phase:   {phase}")?;
        }

        let (score, status) = match self.report {
            Some(ref r) => (r.health_score(), r.status()),
            None => (na(), na()),
        };
        writeln!(f, "  Health score:   {score}")?;
        writeln!(f, "  Status:         {status}")?;

        if let Some(ref report) = self.report {
            let phases = report.phases();
            if !phases.is_empty() {
                writeln!(f, "  Phases:")?;
                for (name, status) in phases {
                    writeln!(f, "    {name}: {status}")?;
                }
            }
            writeln!(f, "  Report:         {}", report.path().display())?;
            if let Some(html) = report.html_companion() {
                writeln!(f, "  HTML report:    {}", html.display())?;
            }
        } else {
            writeln!(f, "  Report:         {NOT_AVAILABLE}")?;
        }
        Ok(())
    }
}
