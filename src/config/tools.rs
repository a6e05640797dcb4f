// ABOUTME: External tool names used by the orchestrator.
// ABOUTME: Defaults match a stock Ansible install; paths may be overridden per project.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToolsConfig {
    #[serde(default = "default_playbook")]
    pub playbook: String,

    #[serde(default = "default_galaxy")]
    pub galaxy: String,

    /// Interpreter the automation engine runs on. `null` disables the check.
    #[serde(default = "default_runtime")]
    pub runtime: Option<String>,

    #[serde(default = "default_ping")]
    pub ping: String,

    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_playbook() -> String {
    "ansible-playbook".to_string()
}

fn default_galaxy() -> String {
    "ansible-galaxy".to_string()
}

fn default_runtime() -> Option<String> {
    Some("python3".to_string())
}

fn default_ping() -> String {
    "ping".to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        ToolsConfig {
            playbook: default_playbook(),
            galaxy: default_galaxy(),
            runtime: default_runtime(),
            ping: default_ping(),
            shell: default_shell(),
        }
    }
}
