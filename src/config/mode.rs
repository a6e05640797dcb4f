// ABOUTME: Operation selector and run modifiers.
// ABOUTME: Built once from the command line and environment, then passed by value.

use clap::ValueEnum;
use std::fmt;

/// Which operation a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Prerequisites, deploy, settle, validate, post-config, summary.
    #[default]
    Full,
    /// Prerequisites, deploy, summary.
    Deploy,
    /// Prerequisites, validate, summary.
    Validate,
    /// Tear the cluster down.
    Cleanup,
    /// Run the health-check script.
    Health,
}

impl Mode {
    /// Whether this mode runs the deployment playbook.
    pub fn deploys(&self) -> bool {
        matches!(self, Mode::Full | Mode::Deploy)
    }

    /// Whether this mode runs the validation playbook (before `skip_validation` applies).
    pub fn validates(&self) -> bool {
        matches!(self, Mode::Full | Mode::Validate)
    }

    /// Whether prerequisites are checked before the mode runs.
    pub fn checks_prerequisites(&self) -> bool {
        self.deploys() || self.validates()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Full => "full",
            Mode::Deploy => "deploy",
            Mode::Validate => "validate",
            Mode::Cleanup => "cleanup",
            Mode::Health => "health",
        };
        f.write_str(name)
    }
}

/// Boolean modifiers shared by every operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Skip confirmation prompts.
    pub force: bool,
    /// Pass `--check` to the automation engine and skip the settle wait.
    pub dry_run: bool,
    pub skip_validation: bool,
    pub verbose: bool,
}
