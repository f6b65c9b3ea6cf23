// Entity - class-to-table mapping of the loader
//
// - Domain: `Entity` descriptor, `EntityKey`, shared object handles

pub mod domain;

pub use domain::{Entity, EntityKey, Shared};

pub(crate) use domain::{downcast, AnyObject, ErasedEntity};
