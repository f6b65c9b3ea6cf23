// Relation Descriptor Domain Models
//
// A relation is a directed edge set between two entities. Rows contribute
// identity pairs; after the fold the pairs are resolved to objects and the
// configured setters link them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::Result;
use crate::features::entity::{Entity, Shared};
use crate::shared::models::{FastIndexMap, Id, IdPair, Row};

// ============================================================
// Arity
// ============================================================

/// How many objects one side of a relation may link to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Arity {
    ZeroOrOne,
    One,
    Many,
}

impl Arity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arity::ZeroOrOne => "ZERO_OR_ONE",
            Arity::One => "ONE",
            Arity::Many => "MANY",
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// Keys and callbacks
// ============================================================

static NEXT_RELATION_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a relation descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationKey(u64);

impl RelationKey {
    pub(crate) fn next() -> Self {
        Self(NEXT_RELATION_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Custom pair extraction: any number of pairs per row
pub type PairExtractor = dyn Fn(&dyn Row) -> Result<Vec<IdPair>> + Send + Sync;

/// Setter applied to a source object of type `S` with its related `T` objects
///
/// The setter runs while the source object is write-locked. Targets are
/// never the source itself: such pairs fail the load before linking.
pub enum Setter<S, T> {
    One(Arc<dyn Fn(&mut S, Shared<T>) + Send + Sync>),
    ZeroOrOne(Arc<dyn Fn(&mut S, Option<Shared<T>>) + Send + Sync>),
    Many(Arc<dyn Fn(&mut S, Vec<Shared<T>>) + Send + Sync>),
}

impl<S, T> Setter<S, T> {
    /// Arity of the opposite side this setter expects
    pub fn arity(&self) -> Arity {
        match self {
            Setter::One(_) => Arity::One,
            Setter::ZeroOrOne(_) => Arity::ZeroOrOne,
            Setter::Many(_) => Arity::Many,
        }
    }
}

impl<S, T> Clone for Setter<S, T> {
    fn clone(&self) -> Self {
        match self {
            Setter::One(f) => Setter::One(Arc::clone(f)),
            Setter::ZeroOrOne(f) => Setter::ZeroOrOne(Arc::clone(f)),
            Setter::Many(f) => Setter::Many(Arc::clone(f)),
        }
    }
}

// ============================================================
// Object Mapping
// ============================================================

/// Source object id -> (source object, related objects in edge order)
pub type Adjacency<S, T> = FastIndexMap<Id, (Shared<S>, Vec<Shared<T>>)>;

/// Complete, bidirectional object mapping of one relation
///
/// Built once at finish time; objects without incident edges are absent.
pub struct ObjectMapping<L, R> {
    pub to_successors: Adjacency<L, R>,
    pub to_predecessors: Adjacency<R, L>,
}

impl<L, R> ObjectMapping<L, R> {
    pub fn new() -> Self {
        Self {
            to_successors: Adjacency::default(),
            to_predecessors: Adjacency::default(),
        }
    }

    pub fn insert(&mut self, pair: IdPair, left: Shared<L>, right: Shared<R>) {
        self.to_successors
            .entry(pair.left_id)
            .or_insert_with(|| (Arc::clone(&left), Vec::new()))
            .1
            .push(Arc::clone(&right));
        self.to_predecessors
            .entry(pair.right_id)
            .or_insert_with(|| (right, Vec::new()))
            .1
            .push(left);
    }

    pub fn is_empty(&self) -> bool {
        self.to_successors.is_empty()
    }
}

impl<L, R> fmt::Debug for ObjectMapping<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMapping")
            .field("successors", &self.to_successors.len())
            .field("predecessors", &self.to_predecessors.len())
            .finish()
    }
}

impl<L, R> Default for ObjectMapping<L, R> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Relation
// ============================================================

/// Key columns and arities of a relation
///
/// `left_arity` bounds how many left objects each right object links to,
/// `right_arity` how many right objects each left object links to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationShape {
    pub left_key: Arc<str>,
    pub right_key: Arc<str>,
    pub left_arity: Arity,
    pub right_arity: Arity,
}

/// Relation between two entities, created by
/// [`RelationBuilder`](crate::features::loader::RelationBuilder)
pub struct Relation<L, R> {
    pub(crate) key: RelationKey,
    pub(crate) left: Entity<L>,
    pub(crate) right: Entity<R>,
    pub(crate) shape: RelationShape,
    pub(crate) left_setter: Option<Setter<L, R>>,
    pub(crate) right_setter: Option<Setter<R, L>>,
    pub(crate) extractor: Option<Arc<PairExtractor>>,
}

impl<L, R> Relation<L, R> {
    pub(crate) fn new(
        left: Entity<L>,
        right: Entity<R>,
        shape: RelationShape,
        left_setter: Option<Setter<L, R>>,
        right_setter: Option<Setter<R, L>>,
        extractor: Option<Arc<PairExtractor>>,
    ) -> Self {
        Self {
            key: RelationKey::next(),
            left,
            right,
            shape,
            left_setter,
            right_setter,
            extractor,
        }
    }

    pub fn key(&self) -> RelationKey {
        self.key
    }

    pub fn left(&self) -> &Entity<L> {
        &self.left
    }

    pub fn right(&self) -> &Entity<R> {
        &self.right
    }

    pub fn shape(&self) -> &RelationShape {
        &self.shape
    }

    pub fn has_custom_extractor(&self) -> bool {
        self.extractor.is_some()
    }
}

impl<L, R> fmt::Display for Relation<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-to-{} Relation<{} ({}), {} ({})>",
            self.shape.left_arity,
            self.shape.right_arity,
            self.left.name(),
            self.shape.left_key,
            self.right.name(),
            self.shape.right_key
        )
    }
}

impl<L, R> fmt::Debug for Relation<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("key", &self.key)
            .field("left", &self.left)
            .field("right", &self.right)
            .field("shape", &self.shape)
            .field("custom_extractor", &self.extractor.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;

    #[test]
    fn test_arity_display() {
        assert_eq!(Arity::ZeroOrOne.to_string(), "ZERO_OR_ONE");
        assert_eq!(Arity::One.to_string(), "ONE");
        assert_eq!(Arity::Many.to_string(), "MANY");
        assert_eq!(
            serde_json::to_string(&Arity::ZeroOrOne).unwrap(),
            "\"ZERO_OR_ONE\""
        );
    }

    #[test]
    fn test_object_mapping_is_bidirectional() {
        let a: Shared<&str> = Arc::new(RwLock::new("a"));
        let x: Shared<i32> = Arc::new(RwLock::new(10));
        let y: Shared<i32> = Arc::new(RwLock::new(11));

        let mut mapping = ObjectMapping::new();
        mapping.insert(IdPair::new(1, 10), Arc::clone(&a), Arc::clone(&x));
        mapping.insert(IdPair::new(1, 11), Arc::clone(&a), Arc::clone(&y));

        let (_, successors) = &mapping.to_successors[&1];
        assert_eq!(successors.len(), 2);
        assert_eq!(*successors[0].read(), 10);
        assert_eq!(*successors[1].read(), 11);

        assert_eq!(mapping.to_predecessors.len(), 2);
        let (object, predecessors) = &mapping.to_predecessors[&11];
        assert!(Arc::ptr_eq(object, &y));
        assert!(Arc::ptr_eq(&predecessors[0], &a));
    }

    #[test]
    fn test_setter_arity() {
        let setter: Setter<i32, i32> = Setter::Many(Arc::new(|_: &mut i32, _: Vec<Shared<i32>>| {}));
        assert_eq!(setter.arity(), Arity::Many);
        assert_eq!(setter.clone().arity(), Arity::Many);
    }
}
