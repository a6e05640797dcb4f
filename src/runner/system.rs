// ABOUTME: Process runner backed by tokio::process.
// ABOUTME: Streams child output to the terminal or appends it to a transcript file.

use async_trait::async_trait;
use snafu::ResultExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::error::{SpawnSnafu, TranscriptSnafu};
use super::{Captured, ExitStatus, Invocation, ProcessRunner, RunnerError};

/// Runs real processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    transcript: Option<PathBuf>,
}

impl SystemRunner {
    /// Child output inherits the terminal.
    pub fn inherit() -> Self {
        Self { transcript: None }
    }

    /// Child stdout and stderr are appended to `path`.
    pub fn with_transcript(path: &Path) -> Self {
        Self {
            transcript: Some(path.to_path_buf()),
        }
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());
        if let Some(ref dir) = invocation.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn transcript_stdio(&self) -> Result<(Stdio, Stdio), RunnerError> {
        match self.transcript {
            None => Ok((Stdio::inherit(), Stdio::inherit())),
            Some(ref path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .context(TranscriptSnafu { path: path.clone() })?;
                let err = file
                    .try_clone()
                    .context(TranscriptSnafu { path: path.clone() })?;
                Ok((Stdio::from(file), Stdio::from(err)))
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ExitStatus, RunnerError> {
        tracing::info!("Running: {}", invocation);

        let (stdout, stderr) = self.transcript_stdio()?;
        let status = Self::command(invocation)
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .await
            .context(SpawnSnafu {
                program: invocation.program.clone(),
            })?;

        let status = ExitStatus::from(status);
        if status.success() {
            tracing::info!("{} completed successfully", invocation.program);
        } else {
            tracing::warn!(
                "{} failed with exit code {:?}",
                invocation.program,
                status.code()
            );
        }
        Ok(status)
    }

    async fn capture(&self, invocation: &Invocation) -> Result<Captured, RunnerError> {
        tracing::debug!("Capturing: {}", invocation);

        let output = Self::command(invocation)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .context(SpawnSnafu {
                program: invocation.program.clone(),
            })?;

        Ok(Captured {
            status: ExitStatus::from(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        if program.contains('/') {
            let path = PathBuf::from(program);
            return is_executable(&path).then_some(path);
        }

        let search = std::env::var_os("PATH")?;
        std::env::split_paths(&search)
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
