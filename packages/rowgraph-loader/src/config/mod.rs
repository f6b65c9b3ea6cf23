//! Loader configuration
//!
//! Two levels:
//! - Preset: `LoaderConfig::preset(Preset::Throughput)`
//! - YAML: `LoaderConfig::from_yaml("loader.yaml")?`, preset plus overrides
//!
//! ```rust,ignore
//! use rowgraph_loader::config::{LoaderConfig, Preset};
//!
//! let config = LoaderConfig::preset(Preset::Balanced).parallel(|p| p.num_workers(4));
//! let loader = Loader::of(&author)
//!     .relation(&author, &book)
//!     /* ... */
//!     .config(config)
//!     .build()?;
//! ```

pub mod error;
pub mod io;
pub mod loader_config;
pub mod preset;
pub mod validation;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use io::ConfigFileV1;
pub use loader_config::{LoaderConfig, ParallelConfig, ParallelConfigPatch, SUPPORTED_VERSIONS};
pub use preset::Preset;
pub use validation::Validatable;
