//! Feature modules, leaves first
//!
//! - entity/       - Entity descriptors (identity + construction)
//! - relation/     - Relation descriptors, pair extraction, linking
//! - object_graph/ - Fold accumulator
//! - loader/       - Fold driver and builder

pub mod entity;
pub mod loader;
pub mod object_graph;
pub mod relation;
