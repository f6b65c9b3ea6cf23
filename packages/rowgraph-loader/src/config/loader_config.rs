//! Loader configuration
//!
//! Only the fold strategy is configurable; entities and relations are
//! described in code through the loader builder.

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;

/// Configuration schema versions this crate reads
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

// ============================================================================
// Parallel fold
// ============================================================================

/// Parallel fold configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of workers (0=rayon global pool, 1..=256 dedicated pool)
    pub num_workers: usize,

    /// Rows per partition (1..=1000000)
    pub batch_size: usize,

    /// Fold partitions with rayon; when false every load is sequential
    pub enable_rayon: bool,
}

impl ParallelConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_workers > 256 {
            return Err(ConfigError::range_with_hint(
                "num_workers",
                self.num_workers,
                0,
                256,
                "Number of workers must be reasonable (0=auto)",
            ));
        }

        if self.batch_size < 1 || self.batch_size > 1_000_000 {
            return Err(ConfigError::range_with_hint(
                "batch_size",
                self.batch_size,
                1,
                1_000_000,
                "Each partition must hold at least one row",
            ));
        }

        Ok(())
    }

    /// Get preset configuration
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Sequential => Self {
                num_workers: 1,
                batch_size: 1_000_000,
                enable_rayon: false,
            },
            Preset::Balanced => Self {
                num_workers: 0, // Auto
                batch_size: 1024,
                enable_rayon: true,
            },
            Preset::Throughput => Self {
                num_workers: 0, // Auto
                batch_size: 16_384,
                enable_rayon: true,
            },
        }
    }

    /// Builder: Set num_workers
    pub fn num_workers(mut self, v: usize) -> Self {
        self.num_workers = v;
        self
    }

    /// Builder: Set batch_size
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Builder: Set enable_rayon
    pub fn enable_rayon(mut self, v: bool) -> Self {
        self.enable_rayon = v;
        self
    }

    /// Worker count actually used by a parallel load
    pub fn effective_workers(&self) -> usize {
        if !self.enable_rayon {
            1
        } else if self.num_workers == 0 {
            num_cpus::get()
        } else {
            self.num_workers
        }
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

/// Patch type for ParallelConfig (all fields optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_rayon: Option<bool>,
}

impl ParallelConfigPatch {
    /// Overlay the set fields on `base`
    pub fn apply(&self, mut base: ParallelConfig) -> ParallelConfig {
        if let Some(v) = self.num_workers {
            base.num_workers = v;
        }
        if let Some(v) = self.batch_size {
            base.batch_size = v;
        }
        if let Some(v) = self.enable_rayon {
            base.enable_rayon = v;
        }
        base
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Complete loader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Schema version
    pub version: u32,

    /// Preset the parallel settings started from
    pub preset: Preset,

    pub parallel: ParallelConfig,
}

impl LoaderConfig {
    pub fn preset(preset: Preset) -> Self {
        Self {
            version: 1,
            preset,
            parallel: ParallelConfig::from_preset(preset),
        }
    }

    /// Builder: adjust the parallel settings
    pub fn parallel(mut self, f: impl FnOnce(ParallelConfig) -> ParallelConfig) -> Self {
        self.parallel = f(self.parallel);
        self
    }

    /// Builder: apply a parallel patch on top of the preset defaults
    pub fn parallel_patch(mut self, patch: &ParallelConfigPatch) -> Self {
        self.parallel = patch.apply(ParallelConfig::from_preset(self.preset));
        self
    }

    pub fn describe(&self) -> String {
        format!(
            "v{} preset={} workers={} batch_size={} rayon={}",
            self.version,
            self.preset,
            self.parallel.effective_workers(),
            self.parallel.batch_size,
            self.parallel.enable_rayon
        )
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

impl Validatable for ParallelConfig {
    fn validate(&self) -> ConfigResult<()> {
        ParallelConfig::validate(self)
    }

    fn config_name(&self) -> &'static str {
        "ParallelConfig"
    }
}

impl Validatable for LoaderConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }
        self.parallel.validate()
    }

    fn config_name(&self) -> &'static str {
        "LoaderConfig"
    }
}
