// ABOUTME: Playbook file locations relative to the project directory.
// ABOUTME: One entry per lifecycle phase that shells out to the automation engine.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlaybookPaths {
    #[serde(default = "default_deploy")]
    pub deploy: PathBuf,

    #[serde(default = "default_validate")]
    pub validate: PathBuf,

    #[serde(default = "default_cleanup")]
    pub cleanup: PathBuf,

    #[serde(default = "default_post_config")]
    pub post_config: PathBuf,
}

fn default_deploy() -> PathBuf {
    PathBuf::from("playbooks/deploy_controllers.yml")
}

fn default_validate() -> PathBuf {
    PathBuf::from("playbooks/validate_deployment.yml")
}

fn default_cleanup() -> PathBuf {
    PathBuf::from("playbooks/cleanup.yml")
}

fn default_post_config() -> PathBuf {
    PathBuf::from("playbooks/post_config.yml")
}

impl Default for PlaybookPaths {
    fn default() -> Self {
        PlaybookPaths {
            deploy: default_deploy(),
            validate: default_validate(),
            cleanup: default_cleanup(),
            post_config: default_post_config(),
        }
    }
}

impl PlaybookPaths {
    pub(crate) fn resolve(&self, base: &std::path::Path) -> Self {
        PlaybookPaths {
            deploy: base.join(&self.deploy),
            validate: base.join(&self.validate),
            cleanup: base.join(&self.cleanup),
            post_config: base.join(&self.post_config),
        }
    }
}
