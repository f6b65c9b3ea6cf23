//! Shared models used by every feature

pub mod models;

pub use models::{FastIndexMap, FastIndexSet, Id, IdPair, MapRow, Row, Value};
