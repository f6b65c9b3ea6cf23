// Relation - directed edge sets between two entities
//
// - Domain: `Relation`, `Arity`, `Setter`, `ObjectMapping`
// - Infrastructure: pair extraction from rows, resolution and linking

pub mod domain;
pub mod infrastructure;

pub use domain::{
    Adjacency, Arity, ObjectMapping, PairExtractor, Relation, RelationKey, RelationShape, Setter,
};
pub use infrastructure::LinkSummary;

pub(crate) use infrastructure::ErasedRelation;
