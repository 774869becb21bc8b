// ABOUTME: Configuration types and parsing for rollout.yml.
// ABOUTME: Handles YAML parsing, file discovery, and template generation.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::rollout::RolloutOptions;
use crate::types::{ArtifactRef, ServiceId};

pub const CONFIG_FILENAME: &str = "rollout.yml";
pub const CONFIG_FILENAME_ALT: &str = "rollout.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".anelixi/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_service_id")]
    pub service: ServiceId,

    #[serde(deserialize_with = "deserialize_artifact_ref")]
    pub artifact: ArtifactRef,

    #[serde(default)]
    pub rollout: RolloutOptions,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn template() -> Self {
        Config {
            service: ServiceId::new("my-app").unwrap(),
            artifact: ArtifactRef::parse("registry.example.com/acme/my-app:v1").unwrap(),
            rollout: RolloutOptions::default(),
        }
    }
}

pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    artifact: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(s) = service {
        config.service = ServiceId::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    if let Some(a) = artifact {
        config.artifact =
            ArtifactRef::parse(a).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"service: {}
artifact: {}
rollout:
  health_timeout: 5m
  poll_interval: 5s
  max_retries: 3
  auto_rollback: true
"#,
        config.service, config.artifact
    )
}

// Custom deserializers

fn deserialize_service_id<'de, D>(deserializer: D) -> std::result::Result<ServiceId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServiceId::new(&s).map_err(serde::de::Error::custom)
}

fn deserialize_artifact_ref<'de, D>(deserializer: D) -> std::result::Result<ArtifactRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ArtifactRef::parse(&s).map_err(serde::de::Error::custom)
}
