// ABOUTME: Application-wide error types for ncdeploy.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::runner::RunnerError;
use crate::state::Phase;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} prerequisite(s) not met")]
    Prerequisites(usize),

    #[error("required file not found: {0}")]
    MissingFile(PathBuf),

    #[error("{phase} failed with exit code {}", display_code(.exit_code))]
    PhaseFailed { phase: Phase, exit_code: Option<i32> },

    #[error("{phase} could not run: {source}")]
    PhaseAborted {
        phase: Phase,
        #[source]
        source: RunnerError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none (terminated by signal)".to_string())
}

impl Error {
    /// Whether the failure already wrote its own `failed` state record.
    pub fn is_recorded(&self) -> bool {
        matches!(self, Error::PhaseFailed { .. } | Error::PhaseAborted { .. })
    }

    /// Whether the failure is outside the expected failure paths (precondition or
    /// external process) and must be handled by the finalizer.
    pub fn is_abnormal(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Yaml(_) | Error::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
