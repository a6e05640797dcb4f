// ABOUTME: Project configuration for ncdeploy.
// ABOUTME: Discovers an optional ncdeploy.yml and resolves every path against the project directory.

mod mode;
mod playbooks;
mod tools;

pub use mode::{Flags, Mode};
pub use playbooks::PlaybookPaths;
pub use tools::ToolsConfig;

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "ncdeploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "ncdeploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".ncdeploy/config.yml";

/// Collections the deployment playbooks import.
pub const DEFAULT_COLLECTIONS: &[&str] = &["cisco.nd", "ansible.netcommon", "ansible.utils"];

/// On-disk project configuration. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_inventory")]
    pub inventory: PathBuf,

    #[serde(default)]
    pub playbooks: PlaybookPaths,

    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    #[serde(default = "default_health_script")]
    pub health_script: PathBuf,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default = "default_collections")]
    pub collections: Vec<String>,

    /// Management address pinged during prerequisite checks.
    #[serde(default)]
    pub management_host: Option<String>,

    #[serde(default = "default_settle_interval", with = "humantime_serde")]
    pub settle_interval: Duration,
}

fn default_inventory() -> PathBuf {
    PathBuf::from("inventory/hosts.yml")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".deployment_state.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/deployment.log")
}

fn default_pid_file() -> PathBuf {
    PathBuf::from(".deploy.pid")
}

fn default_health_script() -> PathBuf {
    PathBuf::from("scripts/health_check.sh")
}

fn default_collections() -> Vec<String> {
    DEFAULT_COLLECTIONS.iter().map(|c| c.to_string()).collect()
}

fn default_settle_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            inventory: default_inventory(),
            playbooks: PlaybookPaths::default(),
            reports_dir: default_reports_dir(),
            state_file: default_state_file(),
            log_file: default_log_file(),
            pid_file: default_pid_file(),
            health_script: default_health_script(),
            tools: ToolsConfig::default(),
            collections: default_collections(),
            management_host: None,
            settle_interval: default_settle_interval(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`, or defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading configuration from {}", path.display());
                return Self::load(path);
            }
        }

        Ok(Config::default())
    }
}

/// Fully resolved settings: absolute paths, constructed once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_dir: PathBuf,
    pub inventory: PathBuf,
    pub playbooks: PlaybookPaths,
    pub reports_dir: PathBuf,
    pub state_file: PathBuf,
    pub log_file: PathBuf,
    pub pid_file: PathBuf,
    pub health_script: PathBuf,
    pub tools: ToolsConfig,
    pub collections: Vec<String>,
    pub management_host: Option<String>,
    pub settle_interval: Duration,
}

impl Settings {
    /// Discover the project config in `project_dir` and resolve it.
    pub fn load(project_dir: &Path) -> Result<Self> {
        if !project_dir.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "project directory {} does not exist",
                project_dir.display()
            )));
        }
        let config = Config::discover(project_dir)?;
        Ok(Self::resolve(project_dir, config))
    }

    pub fn resolve(project_dir: &Path, config: Config) -> Self {
        let base = project_dir.to_path_buf();
        let tools = ToolsConfig {
            playbook: resolve_tool(&base, &config.tools.playbook),
            galaxy: resolve_tool(&base, &config.tools.galaxy),
            runtime: config.tools.runtime.as_deref().map(|r| resolve_tool(&base, r)),
            ping: resolve_tool(&base, &config.tools.ping),
            shell: resolve_tool(&base, &config.tools.shell),
        };

        Settings {
            inventory: base.join(&config.inventory),
            playbooks: config.playbooks.resolve(&base),
            reports_dir: base.join(&config.reports_dir),
            state_file: base.join(&config.state_file),
            log_file: base.join(&config.log_file),
            pid_file: base.join(&config.pid_file),
            health_script: base.join(&config.health_script),
            tools,
            collections: config.collections,
            management_host: config.management_host,
            settle_interval: config.settle_interval,
            project_dir: base,
        }
    }

    /// Create the log and report directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        if let Some(parent) = self.log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&self.reports_dir)?;
        Ok(())
    }
}

/// Relative tool paths (`./bin/x`) resolve against the project; bare names stay on `PATH`.
fn resolve_tool(base: &Path, tool: &str) -> String {
    let path = Path::new(tool);
    if tool.contains('/') && path.is_relative() {
        base.join(path).to_string_lossy().into_owned()
    } else {
        tool.to_string()
    }
}
