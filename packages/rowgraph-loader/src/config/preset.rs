//! Preset configurations
//!
//! Presets pick the parallel fold defaults for common workloads.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::ConfigError;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Single partition, no rayon
    Sequential,

    /// rayon default pool, moderate partitions
    #[default]
    Balanced,

    /// rayon default pool, large partitions (fewer merges)
    Throughput,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Balanced => "balanced",
            Self::Throughput => "throughput",
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "balanced" => Ok(Self::Balanced),
            "throughput" => Ok(Self::Throughput),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
