//! Row-level models: values, rows and identities
//!
//! The loader never sees a database. It reads fields from anything that
//! implements [`Row`]; [`MapRow`] is the in-memory implementation.

mod id;
mod row;
mod value;

pub use id::{Id, IdPair};
pub use row::{MapRow, Row};
pub use value::Value;

/// Insertion-ordered map with the ahash hasher
pub type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

/// Insertion-ordered set with the ahash hasher
pub type FastIndexSet<T> = indexmap::IndexSet<T, ahash::RandomState>;
