// Object Graph (fold accumulator)
//
// Partial result of one fold: objects keyed by (entity, id) and identity
// pairs keyed by relation. Absorption is first-writer-wins for objects and
// set union for pairs, so duplicate rows never change the graph.
//
// Invariants:
// - At most one object per (entity, id) for the whole load
// - Construction happens only on a vacant slot
// - merge() is associative with ObjectGraph::new() as identity

use indexmap::map::Entry;
use serde::Serialize;

use crate::errors::{LoaderError, Result};
use crate::features::entity::{downcast, AnyObject, Entity, EntityKey, ErasedEntity, Shared};
use crate::features::relation::{ObjectMapping, Relation, RelationKey};
use crate::shared::models::{FastIndexMap, FastIndexSet, Id, IdPair, Row};

/// Graph counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub rows_absorbed: usize,
    pub entities: usize,
    pub objects: usize,
    pub relations: usize,
    pub edges: usize,
}

/// Accumulated objects and identity pairs
#[derive(Default)]
pub struct ObjectGraph {
    objects: FastIndexMap<EntityKey, FastIndexMap<Id, AnyObject>>,
    edges: FastIndexMap<RelationKey, FastIndexSet<IdPair>>,
    rows_absorbed: usize,
}

impl ObjectGraph {
    /// Empty graph; the identity element of [`merge`](Self::merge)
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the object for `id` unless one exists; returns whether it was constructed
    pub(crate) fn add_object(
        &mut self,
        entity: &dyn ErasedEntity,
        id: Id,
        row: &dyn Row,
    ) -> Result<bool> {
        match self.objects.entry(entity.key()).or_default().entry(id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(entity.construct(row)?);
                Ok(true)
            }
        }
    }

    pub(crate) fn add_pairs(&mut self, relation: RelationKey, pairs: Vec<IdPair>) {
        if pairs.is_empty() {
            return;
        }
        self.edges.entry(relation).or_default().extend(pairs);
    }

    pub(crate) fn record_row(&mut self) {
        self.rows_absorbed += 1;
    }

    /// Combine with a sibling graph
    ///
    /// Objects already present in `self` win; pair sets are unioned and keep
    /// `self`'s pairs first.
    pub fn merge(&mut self, other: ObjectGraph) {
        for (entity, objects) in other.objects {
            let mine = self.objects.entry(entity).or_default();
            for (id, object) in objects {
                mine.entry(id).or_insert(object);
            }
        }
        for (relation, pairs) in other.edges {
            self.edges.entry(relation).or_default().extend(pairs);
        }
        self.rows_absorbed += other.rows_absorbed;
    }

    /// By-value form of [`merge`](Self::merge) for reductions
    pub fn merged(mut self, other: ObjectGraph) -> Self {
        self.merge(other);
        self
    }

    pub fn rows_absorbed(&self) -> usize {
        self.rows_absorbed
    }

    pub fn is_empty(&self) -> bool {
        self.objects.values().all(|objects| objects.is_empty()) && self.edges.is_empty()
    }

    pub fn contains(&self, entity: EntityKey, id: Id) -> bool {
        self.objects
            .get(&entity)
            .is_some_and(|objects| objects.contains_key(&id))
    }

    pub fn object_count(&self, entity: EntityKey) -> usize {
        self.objects.get(&entity).map_or(0, |objects| objects.len())
    }

    pub fn edge_count(&self, relation: RelationKey) -> usize {
        self.edges.get(&relation).map_or(0, |pairs| pairs.len())
    }

    /// Ids of `entity` in first-encounter order
    pub fn ids(&self, entity: EntityKey) -> Vec<Id> {
        self.objects
            .get(&entity)
            .map(|objects| objects.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Pairs of `relation` in first-encounter order
    pub fn pairs(&self, relation: RelationKey) -> Vec<IdPair> {
        self.edges
            .get(&relation)
            .map(|pairs| pairs.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn object<T: Send + Sync + 'static>(
        &self,
        entity: &Entity<T>,
        id: Id,
    ) -> Result<Option<Shared<T>>> {
        self.objects
            .get(&entity.key())
            .and_then(|objects| objects.get(&id))
            .map(|object| downcast(object, entity.name()))
            .transpose()
    }

    /// All objects of `entity` in first-encounter order
    pub fn objects<T: Send + Sync + 'static>(&self, entity: &Entity<T>) -> Result<Vec<Shared<T>>> {
        match self.objects.get(&entity.key()) {
            Some(objects) => objects
                .values()
                .map(|object| downcast(object, entity.name()))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Translate the pairs of `relation` into objects
    ///
    /// A pair whose left or right object was never constructed fails the load.
    pub fn object_mapping<L, R>(&self, relation: &Relation<L, R>) -> Result<ObjectMapping<L, R>>
    where
        L: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        let mut mapping = ObjectMapping::new();
        let Some(pairs) = self.edges.get(&relation.key()) else {
            return Ok(mapping);
        };

        for pair in pairs {
            let left = self.require(relation, relation.left(), pair.left_id)?;
            let right = self.require(relation, relation.right(), pair.right_id)?;
            mapping.insert(*pair, left, right);
        }
        Ok(mapping)
    }

    fn require<L, R, T>(
        &self,
        relation: &Relation<L, R>,
        entity: &Entity<T>,
        id: Id,
    ) -> Result<Shared<T>>
    where
        T: Send + Sync + 'static,
    {
        self.object(entity, id)?
            .ok_or_else(|| LoaderError::missing_object(relation, entity.name(), id))
    }

    pub fn stats(&self) -> LoadStats {
        LoadStats {
            rows_absorbed: self.rows_absorbed,
            entities: self.objects.len(),
            objects: self.objects.values().map(|objects| objects.len()).sum(),
            relations: self.edges.len(),
            edges: self.edges.values().map(|pairs| pairs.len()).sum(),
        }
    }
}

impl std::fmt::Debug for ObjectGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectGraph")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::errors::ErrorKind;
    use crate::features::relation::{Arity, RelationShape};
    use crate::shared::models::MapRow;

    fn counting_entity(name: &str, calls: Arc<AtomicUsize>) -> Entity<i64> {
        let column = format!("{}.label", name);
        Entity::new(name, "id", move |row: &dyn Row| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(row.id(&column)?.unwrap_or_default())
        })
    }

    fn plain_relation(left: &Entity<i64>, right: &Entity<i64>) -> Relation<i64, i64> {
        Relation::new(
            left.clone(),
            right.clone(),
            RelationShape {
                left_key: Arc::from("a.id"),
                right_key: Arc::from("b.a_id"),
                left_arity: Arity::One,
                right_arity: Arity::Many,
            },
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_add_object_constructs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let entity = counting_entity("a", Arc::clone(&calls));
        let mut graph = ObjectGraph::new();

        let first = MapRow::new().with("a.id", 1).with("a.label", 100);
        let second = MapRow::new().with("a.id", 1).with("a.label", 200);

        assert!(graph.add_object(&entity, 1, &first).unwrap());
        assert!(!graph.add_object(&entity, 1, &second).unwrap());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let object = graph.object(&entity, 1).unwrap().unwrap();
        assert_eq!(*object.read(), 100);
    }

    #[test]
    fn test_identity_scoped_per_entity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let a = counting_entity("a", Arc::clone(&calls));
        let b = counting_entity("b", Arc::clone(&calls));
        let mut graph = ObjectGraph::new();
        let row = MapRow::new().with("a.id", 1).with("b.id", 1);

        assert!(graph.add_object(&a, 1, &row).unwrap());
        assert!(graph.add_object(&b, 1, &row).unwrap());
        assert_eq!(graph.object_count(a.key()), 1);
        assert_eq!(graph.object_count(b.key()), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pairs_are_a_set() {
        let mut graph = ObjectGraph::new();
        let relation = RelationKey::next();

        graph.add_pairs(relation, vec![IdPair::new(1, 10), IdPair::new(1, 11)]);
        graph.add_pairs(relation, vec![IdPair::new(1, 10)]);
        graph.add_pairs(relation, Vec::new());

        assert_eq!(
            graph.pairs(relation),
            vec![IdPair::new(1, 10), IdPair::new(1, 11)]
        );
        assert_eq!(graph.edge_count(RelationKey::next()), 0);
    }

    #[test]
    fn test_merge_first_writer_wins() {
        let entity = counting_entity("a", Arc::new(AtomicUsize::new(0)));
        let relation = RelationKey::next();

        let mut left = ObjectGraph::new();
        left.add_object(&entity, 1, &MapRow::new().with("a.label", 1))
            .unwrap();
        left.add_pairs(relation, vec![IdPair::new(1, 2)]);
        left.record_row();

        let mut right = ObjectGraph::new();
        right
            .add_object(&entity, 1, &MapRow::new().with("a.label", 2))
            .unwrap();
        right
            .add_object(&entity, 3, &MapRow::new().with("a.label", 3))
            .unwrap();
        right.add_pairs(relation, vec![IdPair::new(3, 4), IdPair::new(1, 2)]);
        right.record_row();

        let merged = left.merged(right);
        assert_eq!(merged.ids(entity.key()), vec![1, 3]);
        assert_eq!(*merged.object(&entity, 1).unwrap().unwrap().read(), 1);
        assert_eq!(
            merged.pairs(relation),
            vec![IdPair::new(1, 2), IdPair::new(3, 4)]
        );
        assert_eq!(merged.rows_absorbed(), 2);
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let entity = counting_entity("a", Arc::new(AtomicUsize::new(0)));
        let mut graph = ObjectGraph::new();
        graph
            .add_object(&entity, 5, &MapRow::new().with("a.label", 5))
            .unwrap();

        let graph = ObjectGraph::new().merged(graph).merged(ObjectGraph::new());
        assert_eq!(graph.ids(entity.key()), vec![5]);
        assert_eq!(graph.stats().objects, 1);
        assert!(ObjectGraph::new().is_empty());
    }

    #[test]
    fn test_object_mapping_resolves_pairs() {
        let a = counting_entity("a", Arc::new(AtomicUsize::new(0)));
        let b = counting_entity("b", Arc::new(AtomicUsize::new(0)));
        let relation = plain_relation(&a, &b);

        let mut graph = ObjectGraph::new();
        graph.add_object(&a, 1, &MapRow::new()).unwrap();
        graph.add_object(&b, 10, &MapRow::new()).unwrap();
        graph.add_object(&b, 11, &MapRow::new()).unwrap();
        graph.add_pairs(relation.key(), vec![IdPair::new(1, 10), IdPair::new(1, 11)]);

        let mapping = graph.object_mapping(&relation).unwrap();
        assert_eq!(mapping.to_successors.len(), 1);
        assert_eq!(mapping.to_successors[&1].1.len(), 2);
        assert_eq!(mapping.to_predecessors.len(), 2);
    }

    #[test]
    fn test_object_mapping_dangling_pair() {
        let a = counting_entity("a", Arc::new(AtomicUsize::new(0)));
        let b = counting_entity("b", Arc::new(AtomicUsize::new(0)));
        let relation = plain_relation(&a, &b);

        let mut graph = ObjectGraph::new();
        graph.add_object(&a, 1, &MapRow::new()).unwrap();
        graph.add_pairs(relation.key(), vec![IdPair::new(1, 99)]);

        let err = graph.object_mapping(&relation).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingObject);
        assert!(err.message.contains("b 99"));
    }

    #[test]
    fn test_stats() {
        let a = counting_entity("a", Arc::new(AtomicUsize::new(0)));
        let mut graph = ObjectGraph::new();
        graph.add_object(&a, 1, &MapRow::new()).unwrap();
        graph.add_object(&a, 2, &MapRow::new()).unwrap();
        graph.add_pairs(RelationKey::next(), vec![IdPair::new(1, 2)]);
        graph.record_row();

        assert_eq!(
            graph.stats(),
            LoadStats {
                rows_absorbed: 1,
                entities: 1,
                objects: 2,
                relations: 1,
                edges: 1,
            }
        );
    }
}
