// Pair Extraction
//
// Default extraction reads the two key columns of the relation. A null (or
// absent) key on either side means the row carries no pair, which is how
// optional foreign keys and outer joins are tolerated.

use crate::errors::Result;
use crate::features::relation::domain::Relation;
use crate::shared::models::{IdPair, Row};

impl<L, R> Relation<L, R> {
    /// Identity pairs `row` contributes to this relation
    pub fn extract_pairs(&self, row: &dyn Row) -> Result<Vec<IdPair>> {
        match &self.extractor {
            Some(extract) => extract(row),
            None => self.foreign_key_pairs(row),
        }
    }

    fn foreign_key_pairs(&self, row: &dyn Row) -> Result<Vec<IdPair>> {
        let left_id = row.id(&self.shape.left_key)?;
        let right_id = row.id(&self.shape.right_key)?;

        Ok(match (left_id, right_id) {
            (Some(left_id), Some(right_id)) => vec![IdPair::new(left_id, right_id)],
            _ => Vec::new(),
        })
    }
}
