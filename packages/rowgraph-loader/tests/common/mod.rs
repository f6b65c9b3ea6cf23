//! Common test utilities for rowgraph-loader
//!
//! Shared author/book/tag schema, row generators and assertions.

#![allow(dead_code)]

mod assertions;
mod fixtures;

// Re-export all utilities
pub use assertions::*;
pub use fixtures::*;
