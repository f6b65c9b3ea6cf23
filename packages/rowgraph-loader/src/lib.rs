/*
 * rowgraph-loader - Row stream to linked object graph
 *
 * Feature-First Architecture:
 * - shared/    : Row, Value and identity models
 * - features/  : entity -> relation -> object_graph -> loader
 * - config/    : Fold strategy (presets, YAML)
 *
 * A loader folds the flat rows of a join into one object per identity,
 * then links the objects along the declared relations, enforcing the
 * arity of each side.
 */

#![allow(clippy::type_complexity)] // Setter and extractor callbacks

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration (presets, parallel fold, YAML)
pub mod config;

/// Error types
pub mod errors;

/// Entity, relation, graph accumulator and loader
pub mod features;

/// Row and identity models
pub mod shared;

pub use config::{LoaderConfig, ParallelConfig, Preset};
pub use errors::{ErrorKind, LoaderError, Result};
pub use features::entity::{Entity, EntityKey, Shared};
pub use features::loader::{Loader, LoaderBuilder, RelationBuilder};
pub use features::object_graph::{LoadStats, ObjectGraph};
pub use features::relation::{Arity, LinkSummary, ObjectMapping, Relation, RelationKey};
pub use shared::models::{Id, IdPair, MapRow, Row, Value};
