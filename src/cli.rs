// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Operation flags, modifiers, and their environment-variable defaults.

use clap::builder::FalseyValueParser;
use clap::{ArgGroup, Parser};
use ncdeploy::config::{Flags, Mode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ncdeploy")]
#[command(about = "Deploy, validate, and tear down a network controller cluster with Ansible")]
#[command(version)]
#[command(group(ArgGroup::new("operation").multiple(false)))]
pub struct Cli {
    /// Deploy controllers without validating
    #[arg(long, group = "operation")]
    pub deploy_only: bool,

    /// Validate an existing deployment
    #[arg(long, group = "operation")]
    pub validate_only: bool,

    /// Remove the deployment
    #[arg(long, group = "operation")]
    pub cleanup: bool,

    /// Run the health-check script
    #[arg(long, group = "operation")]
    pub health_check: bool,

    /// Operation to run when no operation flag is given
    #[arg(long, value_enum, env = "DEPLOY_MODE", default_value_t = Mode::Full)]
    pub mode: Mode,

    /// Skip confirmation prompts
    #[arg(short, long, env = "FORCE_DEPLOY", value_parser = FalseyValueParser::new())]
    pub force: bool,

    /// Run playbooks in check mode
    #[arg(long, env = "DRY_RUN", value_parser = FalseyValueParser::new())]
    pub dry_run: bool,

    /// Stream playbook output and enable debug logging
    #[arg(short, long, env = "VERBOSE", value_parser = FalseyValueParser::new())]
    pub verbose: bool,

    /// Skip the validation phase
    #[arg(long, env = "SKIP_VALIDATION", value_parser = FalseyValueParser::new())]
    pub skip_validation: bool,

    /// Project directory holding inventory, playbooks, and state
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}

impl Cli {
    /// An operation flag wins over `--mode`/`DEPLOY_MODE`.
    pub fn mode(&self) -> Mode {
        if self.deploy_only {
            Mode::Deploy
        } else if self.validate_only {
            Mode::Validate
        } else if self.cleanup {
            Mode::Cleanup
        } else if self.health_check {
            Mode::Health
        } else {
            self.mode
        }
    }

    pub fn flags(&self) -> Flags {
        Flags {
            force: self.force,
            dry_run: self.dry_run,
            skip_validation: self.skip_validation,
            verbose: self.verbose,
        }
    }
}
