// ABOUTME: Playbooks the orchestrator hands to the automation engine.
// ABOUTME: Builds ansible-playbook invocations against the fixed inventory.

use std::path::Path;

use crate::config::{Flags, Settings};
use crate::runner::Invocation;
use crate::state::Phase;

/// Lifecycle points that shell out to a playbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playbook {
    Deploy,
    Validate,
    PostConfig,
    Cleanup,
}

impl Playbook {
    /// Phase tag recorded when this playbook fails.
    pub fn phase(&self) -> Phase {
        match self {
            Playbook::Deploy => Phase::Deployment,
            Playbook::Validate => Phase::Validation,
            Playbook::PostConfig => Phase::PostConfig,
            Playbook::Cleanup => Phase::Cleanup,
        }
    }

    /// Whether a missing playbook file is skipped instead of failing.
    pub fn is_optional(&self) -> bool {
        matches!(self, Playbook::PostConfig)
    }

    pub fn path<'a>(&self, settings: &'a Settings) -> &'a Path {
        match self {
            Playbook::Deploy => &settings.playbooks.deploy,
            Playbook::Validate => &settings.playbooks.validate,
            Playbook::PostConfig => &settings.playbooks.post_config,
            Playbook::Cleanup => &settings.playbooks.cleanup,
        }
    }

    pub fn exists(&self, settings: &Settings) -> bool {
        self.path(settings).is_file()
    }

    /// `ansible-playbook -i <inventory> <playbook> [-v] [--check]`, run from the project dir.
    pub fn invocation(&self, settings: &Settings, flags: &Flags) -> Invocation {
        let mut inv = Invocation::new(&settings.tools.playbook)
            .arg("-i")
            .arg(&settings.inventory)
            .arg(self.path(settings))
            .current_dir(&settings.project_dir);
        if flags.verbose {
            inv = inv.arg("-v");
        }
        if flags.dry_run {
            inv = inv.arg("--check");
        }
        inv
    }
}
