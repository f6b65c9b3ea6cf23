//! Configuration I/O (YAML)
//!
//! ```yaml
//! version: 1
//! preset: throughput
//! parallel:
//!   num_workers: 4
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, ConfigResult};
use super::loader_config::{LoaderConfig, ParallelConfigPatch, SUPPORTED_VERSIONS};
use super::preset::Preset;
use super::validation::Validatable;

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset (default: balanced)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// Overrides on top of the preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<ParallelConfigPatch>,
}

impl LoaderConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        if !SUPPORTED_VERSIONS.contains(&file.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: file.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = match &file.preset {
            Some(name) => name.parse::<Preset>()?,
            None => Preset::default(),
        };
        let mut config = LoaderConfig::preset(preset);
        if let Some(patch) = &file.parallel {
            config = config.parallel_patch(patch);
        }

        Validatable::validate(&config)?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: self.version,
            preset: Some(self.preset.to_string()),
            parallel: Some(ParallelConfigPatch {
                num_workers: Some(self.parallel.num_workers),
                batch_size: Some(self.parallel.batch_size),
                enable_rayon: Some(self.parallel.enable_rayon),
            }),
        };

        Ok(serde_yaml::to_string(&file)?)
    }
}
