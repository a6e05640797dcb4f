// ABOUTME: Deployment orchestrator sequencing prerequisite, deploy, validate, and cleanup phases.
// ABOUTME: Every external call either succeeds or halts the run; the state record tracks the outcome.

mod confirm;
mod finalize;

pub use confirm::{
    CLEANUP_CONFIRMATION, Confirm, StdinConfirm, confirms_cleanup, confirms_yes, strip_line_ending,
};
pub use finalize::Finalizer;

use serde_json::Value;

use crate::config::{Flags, Mode, Settings};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::output::Output;
use crate::playbook::Playbook;
use crate::prereq::{PrerequisiteReport, Prerequisites};
use crate::report::{NOT_AVAILABLE, Summary, ValidationReport};
use crate::runner::{ExitStatus, Invocation, ProcessRunner, RunnerError};
use crate::state::{DeploymentState, Phase, StateKind, StateStore};

/// Whether an operation ran or the operator declined it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Skipped,
}

/// Runs the lifecycle phases for one invocation.
pub struct Orchestrator<R, C = StdinConfirm> {
    settings: Settings,
    flags: Flags,
    runner: R,
    confirm: C,
    store: StateStore,
    output: Output,
    diag: Diagnostics,
    deployment_id: String,
}

impl<R: ProcessRunner> Orchestrator<R, StdinConfirm> {
    pub fn new(
        settings: Settings,
        flags: Flags,
        runner: R,
        deployment_id: impl Into<String>,
    ) -> Self {
        let store = StateStore::new(&settings.state_file);
        Self {
            output: Output::new(flags.verbose),
            settings,
            flags,
            runner,
            confirm: StdinConfirm,
            store,
            diag: Diagnostics::default(),
            deployment_id: deployment_id.into(),
        }
    }
}

impl<R: ProcessRunner, C: Confirm> Orchestrator<R, C> {
    /// Replace the confirmation source.
    pub fn with_confirm<C2: Confirm>(self, confirm: C2) -> Orchestrator<R, C2> {
        Orchestrator {
            settings: self.settings,
            flags: self.flags,
            runner: self.runner,
            confirm,
            store: self.store,
            output: self.output,
            diag: self.diag,
            deployment_id: self.deployment_id,
        }
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    /// Run the phases `mode` selects.
    pub async fn run(&mut self, mode: Mode) -> Result<Outcome> {
        self.output.start_timer();
        tracing::info!(
            mode = %mode,
            deployment_id = %self.deployment_id,
            dry_run = self.flags.dry_run,
            skip_validation = self.flags.skip_validation,
            "Starting run"
        );

        let outcome = self.run_mode(mode).await;

        for warning in self.diag.warnings() {
            self.output.warning(&warning.message);
        }

        match outcome? {
            Outcome::Completed => {
                self.output.done(&format!("{mode} run completed"));
                Ok(Outcome::Completed)
            }
            Outcome::Skipped => {
                self.output.progress("Nothing was changed");
                Ok(Outcome::Skipped)
            }
        }
    }

    async fn run_mode(&mut self, mode: Mode) -> Result<Outcome> {
        if mode.checks_prerequisites() {
            self.check_prerequisites(mode).await?;
        }
        match mode {
            Mode::Full => self.run_full().await,
            Mode::Deploy => self.run_deploy_only().await,
            Mode::Validate => self.run_validate_only().await,
            Mode::Cleanup => self.cleanup_deployment().await,
            Mode::Health => self.run_health_check().await.map(|()| Outcome::Completed),
        }
    }

    async fn run_full(&mut self) -> Result<Outcome> {
        if self.deploy_controllers().await? == Outcome::Skipped {
            return Ok(Outcome::Skipped);
        }
        if !self.flags.skip_validation {
            self.settle().await;
        }
        self.validate_deployment().await?;
        self.post_deployment_config().await?;
        self.generate_summary_report()?;
        Ok(Outcome::Completed)
    }

    async fn run_deploy_only(&mut self) -> Result<Outcome> {
        let outcome = self.deploy_controllers().await?;
        self.generate_summary_report()?;
        Ok(outcome)
    }

    async fn run_validate_only(&mut self) -> Result<Outcome> {
        self.validate_deployment().await?;
        self.generate_summary_report()?;
        Ok(Outcome::Completed)
    }

    /// Fails with the unmet-requirement count when anything is missing.
    pub async fn check_prerequisites(&mut self, mode: Mode) -> Result<PrerequisiteReport> {
        self.output.header("Checking prerequisites");

        let report = Prerequisites::new(&self.runner, &self.settings, &self.flags, &self.output)
            .check(mode, &mut self.diag)
            .await;

        if !report.is_satisfied() {
            return Err(Error::Prerequisites(report.count()));
        }
        self.output.success("All prerequisites met");
        Ok(report)
    }

    /// Run the deployment playbook and record `deployed` or `failed`.
    pub async fn deploy_controllers(&mut self) -> Result<Outcome> {
        self.output.header("Deploying controllers");

        if !self.flags.force
            && let Some(existing) = self.current_state()
            && existing.state == StateKind::Deployed
        {
            self.output.warning(&format!(
                "Deployment {} is already recorded as deployed",
                existing.deployment_id
            ));
            let answer = self.confirm.ask("Redeploy over it? (yes/no):").await?;
            if !confirms_yes(answer.as_deref()) {
                self.output.progress("Deployment cancelled");
                return Ok(Outcome::Skipped);
            }
        }

        self.run_playbook(Playbook::Deploy, "Running deployment playbook")
            .await?;

        let state = DeploymentState::new(StateKind::Deployed, &self.deployment_id)
            .with("status", "success")
            .with("dry_run", self.flags.dry_run);
        self.store.save(&state)?;
        self.output.success("Controllers deployed");
        Ok(Outcome::Completed)
    }

    /// Run the validation playbook and record the newest report's verdict.
    pub async fn validate_deployment(&mut self) -> Result<()> {
        if self.flags.skip_validation {
            self.output.progress("Skipping validation");
            return Ok(());
        }
        self.output.header("Validating deployment");

        self.run_playbook(Playbook::Validate, "Running validation playbook")
            .await?;

        let report = self.latest_report();
        let (status, score, healthy) = match report {
            Some(ref r) => (r.status(), r.health_score_value(), r.is_success()),
            None => (
                NOT_AVAILABLE.to_string(),
                Value::String(NOT_AVAILABLE.to_string()),
                false,
            ),
        };

        let state = DeploymentState::new(StateKind::Validated, &self.deployment_id)
            .with("status", if healthy { "success" } else { "warning" })
            .with("health_score", score)
            .with("validation_status", status.clone());
        self.store.save(&state)?;

        if healthy {
            let score = report
                .as_ref()
                .map(|r| r.health_score())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            self.output
                .success(&format!("Validation passed (health score {score})"));
        } else {
            self.diag.warn(Warning::degraded(format!(
                "validation completed with status {status}"
            )));
        }
        Ok(())
    }

    /// Apply the optional post-deployment playbook. Never fails the run.
    pub async fn post_deployment_config(&mut self) -> Result<()> {
        let playbook = Playbook::PostConfig;
        if !self.playbook_present(playbook)? {
            return Ok(());
        }
        self.output.header("Post-deployment configuration");

        let invocation = playbook.invocation(&self.settings, &self.flags);
        let result = self
            .execute(&invocation, "Applying post-deployment configuration")
            .await;
        let phase = playbook.phase();
        match result {
            Ok(status) if status.success() => {
                self.output.success("Post-deployment configuration applied");
            }
            Ok(status) => self.diag.warn(Warning::post_config(format!(
                "{phase} playbook exited with code {:?}",
                status.code()
            ))),
            Err(e) => self.diag.warn(Warning::post_config(format!(
                "{phase} playbook could not run: {e}"
            ))),
        }
        Ok(())
    }

    /// Tear down after exact-literal confirmation; removes the state record on success.
    pub async fn cleanup_deployment(&mut self) -> Result<Outcome> {
        self.output.header("Cleaning up deployment");

        self.playbook_present(Playbook::Cleanup)?;

        if !self.flags.force {
            self.output
                .warning("This removes the controller cluster and its configuration.");
            let answer = self
                .confirm
                .ask(&format!("Type '{CLEANUP_CONFIRMATION}' to confirm:"))
                .await?;
            if !confirms_cleanup(answer.as_deref()) {
                self.output.progress("Cleanup cancelled");
                return Ok(Outcome::Skipped);
            }
        }

        self.run_playbook(Playbook::Cleanup, "Running cleanup playbook")
            .await?;

        self.store.clear()?;
        self.output.success("Deployment removed");
        Ok(Outcome::Completed)
    }

    /// Run the health-check script. A missing script is a failure.
    pub async fn run_health_check(&mut self) -> Result<()> {
        self.output.header("Health check");

        let script = &self.settings.health_script;
        if !script.is_file() {
            return Err(Error::MissingFile(script.clone()));
        }
        let invocation = Invocation::new(&self.settings.tools.shell)
            .arg(script)
            .current_dir(&self.settings.project_dir);

        self.run_phase(Phase::HealthCheck, &invocation, "Running health check")
            .await?;
        self.output.success("Health check passed");
        Ok(())
    }

    /// Render the current state and newest report. Read-only.
    pub fn generate_summary_report(&self) -> Result<Summary> {
        let report = match ValidationReport::latest(&self.settings.reports_dir) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Could not read validation report: {}", e);
                None
            }
        };
        let summary = Summary::new(self.current_state(), report);

        self.output.header("Deployment summary");
        self.output.text(summary.to_string().trim_end());
        Ok(summary)
    }

    async fn settle(&self) {
        let interval = self.settings.settle_interval;
        if self.flags.dry_run || interval.is_zero() {
            return;
        }
        let spinner = self.output.spinner(&format!(
            "Waiting {}s for services to stabilize",
            interval.as_secs()
        ));
        tokio::time::sleep(interval).await;
        spinner.finish();
    }

    /// Current record; an unreadable file is treated as absent.
    fn current_state(&self) -> Option<DeploymentState> {
        self.store.load().unwrap_or_else(|e| {
            tracing::warn!(
                "Ignoring unreadable state file {}: {}",
                self.store.path().display(),
                e
            );
            None
        })
    }

    fn latest_report(&mut self) -> Option<ValidationReport> {
        match ValidationReport::latest(&self.settings.reports_dir) {
            Ok(Some(report)) => {
                tracing::info!("Using validation report {}", report.path().display());
                Some(report)
            }
            Ok(None) => {
                self.diag.warn(Warning::report(format!(
                    "no validation report found in {}",
                    self.settings.reports_dir.display()
                )));
                None
            }
            Err(e) => {
                self.diag
                    .warn(Warning::report(format!("could not read validation report: {e}")));
                None
            }
        }
    }

    /// Whether `playbook` is on disk. Only optional playbooks may be absent.
    fn playbook_present(&self, playbook: Playbook) -> Result<bool> {
        if playbook.exists(&self.settings) {
            return Ok(true);
        }
        if playbook.is_optional() {
            tracing::debug!("No {} playbook, skipping", playbook.phase());
            return Ok(false);
        }
        Err(Error::MissingFile(playbook.path(&self.settings).to_path_buf()))
    }

    async fn run_playbook(&mut self, playbook: Playbook, label: &str) -> Result<()> {
        let invocation = playbook.invocation(&self.settings, &self.flags);
        self.run_phase(playbook.phase(), &invocation, label).await
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        label: &str,
    ) -> std::result::Result<ExitStatus, RunnerError> {
        let spinner = self.output.spinner(label);
        let result = self.runner.run(invocation).await;
        spinner.finish();
        result
    }

    /// Execute a phase; any failure is recorded as `failed` with the phase tag.
    async fn run_phase(&mut self, phase: Phase, invocation: &Invocation, label: &str) -> Result<()> {
        let result = self.execute(invocation, label).await;
        match result {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                self.record_failure(phase, status.code())?;
                Err(Error::PhaseFailed {
                    phase,
                    exit_code: status.code(),
                })
            }
            Err(source) => {
                self.record_failure(phase, None)?;
                Err(Error::PhaseAborted { phase, source })
            }
        }
    }

    fn record_failure(&mut self, phase: Phase, exit_code: Option<i32>) -> Result<()> {
        self.store
            .save(&DeploymentState::failed(&self.deployment_id, phase, exit_code))?;
        self.output.error(&format!("{phase} failed"));
        Ok(())
    }
}
