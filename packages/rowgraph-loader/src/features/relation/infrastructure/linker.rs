// Relation Linker
//
// UNRESOLVED -> RESOLVED, once per load. The merged graph translates every
// identity pair into objects, then each configured setter is applied with
// the arity of the opposite side enforced:
// - ONE: exactly one candidate per source object
// - ZERO_OR_ONE: at most one candidate
// - MANY: all candidates, in edge order
// Objects without incident edges are never visited.
//
// Setters run under the source object's write lock. On a relation from an
// entity to itself, a pair linking an object to itself is rejected before
// any setter runs: the setter would receive a handle to the locked object.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::{LoaderError, Result};
use crate::features::object_graph::ObjectGraph;
use crate::features::relation::domain::{
    Adjacency, Arity, ObjectMapping, Relation, RelationKey, Setter,
};
use crate::shared::models::{Id, IdPair, Row};

/// Number of source objects each setter was applied to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkSummary {
    pub left_linked: usize,
    pub right_linked: usize,
}

impl<L: Send + Sync + 'static, R: Send + Sync + 'static> Relation<L, R> {
    /// Apply the configured setters to a resolved mapping
    pub fn link(&self, mapping: ObjectMapping<L, R>) -> Result<LinkSummary> {
        let ObjectMapping {
            to_successors,
            to_predecessors,
        } = mapping;
        let mut summary = LinkSummary::default();
        let reflexive = self.left.key() == self.right.key();

        if let Some(setter) = &self.left_setter {
            let side = Side {
                relation: self,
                source: self.left.name(),
                target: self.right.name(),
                reflexive,
            };
            summary.left_linked = side.apply(setter, to_successors, self.shape.right_arity)?;
        }
        if let Some(setter) = &self.right_setter {
            let side = Side {
                relation: self,
                source: self.right.name(),
                target: self.left.name(),
                reflexive,
            };
            summary.right_linked = side.apply(setter, to_predecessors, self.shape.left_arity)?;
        }

        Ok(summary)
    }
}

/// One direction of a relation, for setter application and messages
struct Side<'a> {
    relation: &'a dyn fmt::Display,
    source: &'a str,
    target: &'a str,
    reflexive: bool,
}

impl Side<'_> {
    fn apply<S, T>(
        &self,
        setter: &Setter<S, T>,
        adjacency: Adjacency<S, T>,
        arity: Arity,
    ) -> Result<usize> {
        let linked = adjacency.len();
        if self.reflexive {
            self.reject_self_links(&adjacency)?;
        }

        match (setter, arity) {
            (Setter::Many(set), Arity::Many) => {
                for (_, (object, targets)) in adjacency {
                    let mut guard = object.write();
                    set(&mut *guard, targets);
                }
            }
            (Setter::One(set), Arity::One) => {
                for (id, (object, targets)) in adjacency {
                    let candidate = self
                        .at_most_one(id, targets, arity)?
                        .ok_or_else(|| self.violation(id, 0, arity))?;
                    let mut guard = object.write();
                    set(&mut *guard, candidate);
                }
            }
            (Setter::ZeroOrOne(set), Arity::ZeroOrOne) => {
                for (id, (object, targets)) in adjacency {
                    let candidate = self.at_most_one(id, targets, arity)?;
                    let mut guard = object.write();
                    set(&mut *guard, candidate);
                }
            }
            (setter, arity) => {
                return Err(LoaderError::configuration(format!(
                    "{}: setter on {} expects {} but the {} side has arity {}",
                    self.relation,
                    self.source,
                    setter.arity(),
                    self.target,
                    arity
                )));
            }
        }

        Ok(linked)
    }

    fn reject_self_links<S, T>(&self, adjacency: &Adjacency<S, T>) -> Result<()> {
        for (id, (object, targets)) in adjacency {
            let source = Arc::as_ptr(object).cast::<()>();
            if targets
                .iter()
                .any(|target| Arc::as_ptr(target).cast::<()>() == source)
            {
                return Err(LoaderError::configuration(format!(
                    "{}: {} {} is linked to itself, which its setter cannot receive",
                    self.relation, self.source, id
                )));
            }
        }
        Ok(())
    }

    fn at_most_one<T>(&self, id: Id, mut targets: Vec<T>, arity: Arity) -> Result<Option<T>> {
        if targets.len() > 1 {
            return Err(self.violation(id, targets.len(), arity));
        }
        Ok(targets.pop())
    }

    fn violation(&self, id: Id, found: usize, arity: Arity) -> LoaderError {
        let expected = match arity {
            Arity::One => "exactly one",
            _ => "at most one",
        };
        warn!(
            "Cardinality violation in {}: {} {} has {} {} candidates",
            self.relation, self.source, id, found, self.target
        );
        LoaderError::cardinality(format!(
            "{} contains conflicting tuples: {} {} relates to {} {} objects, expected {}. \
             Verify that the rows abide by the loader definition.",
            self.relation, self.source, id, found, self.target, expected
        ))
    }
}

// ============================================================
// Type-erased view used by the loader
// ============================================================

/// Object-safe view of a relation
pub(crate) trait ErasedRelation: Send + Sync {
    fn key(&self) -> RelationKey;
    fn describe(&self) -> String;
    fn pairs_from_row(&self, row: &dyn Row) -> Result<Vec<IdPair>>;
    fn resolve(&self, graph: &ObjectGraph) -> Result<LinkSummary>;
}

impl<L: Send + Sync + 'static, R: Send + Sync + 'static> ErasedRelation for Relation<L, R> {
    fn key(&self) -> RelationKey {
        self.key
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn pairs_from_row(&self, row: &dyn Row) -> Result<Vec<IdPair>> {
        self.extract_pairs(row)
    }

    fn resolve(&self, graph: &ObjectGraph) -> Result<LinkSummary> {
        let mapping = graph.object_mapping(self)?;
        let summary = self.link(mapping)?;
        debug!(
            "Linked {}: {} left, {} right objects",
            self, summary.left_linked, summary.right_linked
        );
        Ok(summary)
    }
}
