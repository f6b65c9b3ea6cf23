//! Graph accumulator: the partial result of a fold

pub mod domain;

pub use domain::{LoadStats, ObjectGraph};
