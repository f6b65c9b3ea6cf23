// Graph Reducer
//
// seed -> absorb* -> merge* -> finish. The loader itself is immutable; all
// fold state lives in the ObjectGraph, so one loader can drive any number
// of loads and partitions concurrently.

use once_cell::sync::OnceCell;
use rayon::ThreadPool;
use std::sync::Arc;
use tracing::debug;

use crate::config::{LoaderConfig, Validatable};
use crate::errors::Result;
use crate::features::entity::{Entity, ErasedEntity, Shared};
use crate::features::loader::builder::LoaderBuilder;
use crate::features::object_graph::ObjectGraph;
use crate::features::relation::ErasedRelation;
use crate::shared::models::Row;

/// Folds rows into linked objects of the main entity `T`
pub struct Loader<T> {
    pub(crate) main: Entity<T>,
    pub(crate) entities: Vec<Arc<dyn ErasedEntity>>,
    pub(crate) relations: Vec<Arc<dyn ErasedRelation>>,
    pub(crate) config: LoaderConfig,
    /// Dedicated worker pool, built on the first parallel fold that needs one
    pub(crate) pool: OnceCell<ThreadPool>,
}

impl<T: Send + Sync + 'static> Loader<T> {
    /// Start describing a loader whose result is the objects of `main`
    pub fn of(main: &Entity<T>) -> LoaderBuilder<T> {
        LoaderBuilder::new(main)
    }

    pub fn main(&self) -> &Entity<T> {
        &self.main
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Replace the configuration after validating it
    pub fn with_config(mut self, config: LoaderConfig) -> Result<Self> {
        Validatable::validate(&config)?;
        self.config = config;
        self.pool = OnceCell::new();
        Ok(self)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Relation descriptions, in definition order
    pub fn describe_relations(&self) -> Vec<String> {
        self.relations.iter().map(|r| r.describe()).collect()
    }

    /// Empty accumulator
    pub fn seed(&self) -> ObjectGraph {
        ObjectGraph::new()
    }

    /// Absorb one row into `graph`
    ///
    /// Objects are constructed only for identities not yet in the graph;
    /// pairs are unioned into each relation's set.
    pub fn absorb(&self, graph: &mut ObjectGraph, row: &dyn Row) -> Result<()> {
        for entity in &self.entities {
            if let Some(id) = entity.id_of(row)? {
                graph.add_object(entity.as_ref(), id, row)?;
            }
        }
        for relation in &self.relations {
            graph.add_pairs(relation.key(), relation.pairs_from_row(row)?);
        }
        graph.record_row();
        Ok(())
    }

    /// Combine two partial accumulators (`left` wins on shared identities)
    pub fn merge(&self, left: ObjectGraph, right: ObjectGraph) -> ObjectGraph {
        left.merged(right)
    }

    /// Absorb every row of `rows` into a fresh accumulator
    pub fn fold<I, R>(&self, rows: I) -> Result<ObjectGraph>
    where
        I: IntoIterator<Item = R>,
        R: Row,
    {
        let mut graph = self.seed();
        for row in rows {
            self.absorb(&mut graph, &row)?;
        }
        Ok(graph)
    }

    /// Resolve every relation, then return the main entity's objects
    ///
    /// Consumes the graph: a finished accumulator cannot be resolved again.
    pub fn finish(&self, graph: ObjectGraph) -> Result<Vec<Shared<T>>> {
        for relation in &self.relations {
            relation.resolve(&graph)?;
        }

        let objects = graph.objects(&self.main)?;
        debug!(
            "Finished load of {}: {} objects from {} rows ({:?})",
            self.main,
            objects.len(),
            graph.rows_absorbed(),
            graph.stats()
        );
        Ok(objects)
    }

    /// Sequential load
    pub fn load<I, R>(&self, rows: I) -> Result<Vec<Shared<T>>>
    where
        I: IntoIterator<Item = R>,
        R: Row,
    {
        debug!("Loading {} sequentially", self.main);
        let graph = self.fold(rows)?;
        self.finish(graph)
    }
}

impl<T> std::fmt::Debug for Loader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("main", &self.main)
            .field("entities", &self.entities.len())
            .field("relations", &self.relations.len())
            .field("config", &self.config)
            .field("pool_threads", &self.pool.get().map(|p| p.current_num_threads()))
            .finish()
    }
}
