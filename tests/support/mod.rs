// ABOUTME: Test support utilities.
// ABOUTME: Stub process runner, scripted confirmations, and temporary project fixtures.

use async_trait::async_trait;
use ncdeploy::config::{Config, Flags, Settings};
use ncdeploy::error::Result;
use ncdeploy::orchestrator::{Confirm, Orchestrator};
use ncdeploy::output::Output;
use ncdeploy::runner::{Captured, ExitStatus, Invocation, ProcessRunner, RunnerError};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use std::time::Duration;
use tempfile::TempDir;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("ncdeploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Records invocations and answers with scripted exit codes.
#[derive(Default)]
pub struct StubRunner {
    calls: Mutex<Vec<Invocation>>,
    failures: Vec<(String, i32)>,
    missing: Vec<String>,
}

#[allow(dead_code)]
impl StubRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any invocation whose command line contains `pattern` exits with `code`.
    pub fn failing(mut self, pattern: &str, code: i32) -> Self {
        self.failures.push((pattern.to_string(), code));
        self
    }

    /// `locate` reports `program` as absent.
    pub fn without(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Command lines in call order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.command_lines().iter().any(|c| c.contains(pattern))
    }

    fn exit_for(&self, invocation: &Invocation) -> ExitStatus {
        let line = invocation.to_string();
        let code = self
            .failures
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        ExitStatus::from_code(code)
    }
}

#[async_trait]
impl ProcessRunner for StubRunner {
    async fn run(&self, invocation: &Invocation) -> std::result::Result<ExitStatus, RunnerError> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok(self.exit_for(invocation))
    }

    async fn capture(
        &self,
        invocation: &Invocation,
    ) -> std::result::Result<Captured, RunnerError> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok(Captured {
            status: self.exit_for(invocation),
            stdout: invocation.args.join(" "),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing.iter().any(|m| m == program) {
            None
        } else {
            Some(Path::new("/usr/bin").join(program))
        }
    }
}

/// Answers prompts from a fixed list; `None` once exhausted.
#[derive(Default)]
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedConfirm {
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn ask(&self, prompt: &str) -> Result<Option<String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answers.lock().unwrap().pop_front())
    }
}

/// A temporary project directory with inventory and the required playbooks.
pub struct Project {
    pub dir: TempDir,
    pub settings: Settings,
}

#[allow(dead_code)]
impl Project {
    pub fn new() -> Self {
        let config = Config {
            settle_interval: Duration::ZERO,
            ..Config::default()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let dir = TempDir::new().unwrap();
        let settings = Settings::resolve(dir.path(), config);
        settings.ensure_dirs().unwrap();

        let project = Self { dir, settings };
        project.write("inventory/hosts.yml", "all:\n  hosts: {}\n");
        project.write("playbooks/deploy_controllers.yml", "---\n");
        project.write("playbooks/validate_deployment.yml", "---\n");
        project.write("playbooks/cleanup.yml", "---\n");
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.dir.path().join(relative)).unwrap();
    }

    pub fn orchestrator(
        &self,
        flags: Flags,
        runner: StubRunner,
        confirm: ScriptedConfirm,
    ) -> Orchestrator<StubRunner, ScriptedConfirm> {
        Orchestrator::new(self.settings.clone(), flags, runner, "20260101_120000")
            .with_confirm(confirm)
            .with_output(Output::plain())
    }
}
