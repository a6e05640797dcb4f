// ABOUTME: Prerequisite checks run before any mutating phase.
// ABOUTME: Counts unmet requirements; installs missing collections; pings the management host.

use std::fmt;
use std::path::PathBuf;

use crate::config::{Flags, Mode, Settings};
use crate::diagnostics::{Diagnostics, Warning};
use crate::output::Output;
use crate::playbook::Playbook;
use crate::runner::{Invocation, ProcessRunner};

/// A requirement that was not satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unmet {
    Tool(String),
    Collection(String),
    File(PathBuf),
}

impl fmt::Display for Unmet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unmet::Tool(name) => write!(f, "{name} not found"),
            Unmet::Collection(name) => write!(f, "collection {name} is not installed"),
            Unmet::File(path) => write!(f, "{} not found", path.display()),
        }
    }
}

/// Outcome of a prerequisite check.
#[derive(Debug, Default)]
pub struct PrerequisiteReport {
    pub unmet: Vec<Unmet>,
}

impl PrerequisiteReport {
    pub fn count(&self) -> usize {
        self.unmet.len()
    }

    pub fn is_satisfied(&self) -> bool {
        self.unmet.is_empty()
    }
}

/// Checks tools, collections, input files, and endpoint reachability.
pub struct Prerequisites<'a, R: ?Sized> {
    runner: &'a R,
    settings: &'a Settings,
    flags: &'a Flags,
    output: &'a Output,
}

impl<'a, R: ProcessRunner + ?Sized> Prerequisites<'a, R> {
    pub fn new(runner: &'a R, settings: &'a Settings, flags: &'a Flags, output: &'a Output) -> Self {
        Self {
            runner,
            settings,
            flags,
            output,
        }
    }

    pub async fn check(&self, mode: Mode, diag: &mut Diagnostics) -> PrerequisiteReport {
        let mut report = PrerequisiteReport::default();

        self.check_tool(&self.settings.tools.playbook, &mut report);
        if let Some(ref runtime) = self.settings.tools.runtime {
            self.check_tool(runtime, &mut report);
        }

        if !self.settings.collections.is_empty() {
            if self.check_tool(&self.settings.tools.galaxy, &mut report) {
                for collection in &self.settings.collections {
                    self.ensure_collection(collection, &mut report).await;
                }
            } else {
                for collection in &self.settings.collections {
                    report.unmet.push(Unmet::Collection(collection.clone()));
                }
            }
        }

        self.check_file(self.settings.inventory.clone(), &mut report);
        if mode.deploys() {
            self.check_file(Playbook::Deploy.path(self.settings).to_path_buf(), &mut report);
        }
        if mode.validates() && !self.flags.skip_validation {
            self.check_file(Playbook::Validate.path(self.settings).to_path_buf(), &mut report);
        }

        if let Some(ref host) = self.settings.management_host {
            self.ping(host, diag).await;
        }

        for unmet in &report.unmet {
            self.output.error(&unmet.to_string());
        }
        report
    }

    fn check_tool(&self, tool: &str, report: &mut PrerequisiteReport) -> bool {
        match self.runner.locate(tool) {
            Some(path) => {
                tracing::debug!("Found {} at {}", tool, path.display());
                true
            }
            None => {
                report.unmet.push(Unmet::Tool(tool.to_string()));
                false
            }
        }
    }

    fn check_file(&self, path: PathBuf, report: &mut PrerequisiteReport) {
        if path.is_file() {
            tracing::debug!("Found {}", path.display());
        } else {
            report.unmet.push(Unmet::File(path));
        }
    }

    async fn ensure_collection(&self, collection: &str, report: &mut PrerequisiteReport) {
        if self.collection_installed(collection).await {
            tracing::debug!("Collection {} is installed", collection);
            return;
        }

        self.output
            .progress(&format!("Installing collection {collection}..."));
        let install = Invocation::new(&self.settings.tools.galaxy)
            .args(["collection", "install", collection]);
        match self.runner.run(&install).await {
            Ok(status) if status.success() => {
                self.output
                    .success(&format!("Installed collection {collection}"));
            }
            Ok(status) => {
                tracing::warn!(
                    "Installing {} exited with {:?}",
                    collection,
                    status.code()
                );
                report.unmet.push(Unmet::Collection(collection.to_string()));
            }
            Err(e) => {
                tracing::warn!("Installing {} failed: {}", collection, e);
                report.unmet.push(Unmet::Collection(collection.to_string()));
            }
        }
    }

    async fn collection_installed(&self, collection: &str) -> bool {
        let list = Invocation::new(&self.settings.tools.galaxy)
            .args(["collection", "list", collection]);
        match self.runner.capture(&list).await {
            Ok(captured) => captured.status.success() && captured.stdout.contains(collection),
            Err(e) => {
                tracing::warn!("Listing collection {} failed: {}", collection, e);
                false
            }
        }
    }

    async fn ping(&self, host: &str, diag: &mut Diagnostics) {
        let ping = Invocation::new(&self.settings.tools.ping).args(["-c", "1", "-W", "2", host]);
        match self.runner.capture(&ping).await {
            Ok(captured) if captured.status.success() => {
                tracing::debug!("Management endpoint {} is reachable", host);
            }
            Ok(_) => diag.warn(Warning::unreachable(format!(
                "management endpoint {host} did not answer ping"
            ))),
            Err(e) => diag.warn(Warning::unreachable(format!(
                "could not ping management endpoint {host}: {e}"
            ))),
        }
    }
}
