use serde::{Deserialize, Serialize};

/// Identity of one entity instance, scoped to its entity
pub type Id = i64;

/// A pair of related identities: one edge of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdPair {
    pub left_id: Id,
    pub right_id: Id,
}

impl IdPair {
    pub const fn new(left_id: Id, right_id: Id) -> Self {
        Self { left_id, right_id }
    }
}

impl From<(Id, Id)> for IdPair {
    fn from((left_id, right_id): (Id, Id)) -> Self {
        Self::new(left_id, right_id)
    }
}
