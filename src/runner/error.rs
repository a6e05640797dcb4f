// ABOUTME: Process runner error types with SNAFU pattern.
// ABOUTME: Separates "could not start" from "ran and failed", which is an exit status.

use snafu::Snafu;
use std::path::PathBuf;

/// Failure to launch an external process.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RunnerError {
    #[snafu(display("failed to start {program}: {source}"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("failed to open transcript {}: {source}", path.display()))]
    Transcript {
        path: PathBuf,
        source: std::io::Error,
    },
}
